//! Object pool classifier. The header inserts an asset id between the
//! component and the message.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{continuation_of, optional};
use crate::fields::{EventFields, ObjectPoolFields};
use crate::grouper::group_by_header;
use crate::model::{LogEvent, LogLevel, LogType, ParsedLog};
use crate::registry::LogClassifier;
use crate::timefmt::normalize_timestamp;

static HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?P<timestamp>\d{4}-\d{2}-\d{2} [^|]+)\|(?P<version>[^|]*)\|Error\|objectPool\|(?P<assetId>[^|]+)\|(?P<message>.*)$",
    )
    .unwrap()
});

pub struct ObjectPoolLogs;

impl LogClassifier for ObjectPoolLogs {
    fn log_type(&self) -> LogType {
        LogType::ObjectPool
    }

    fn parse(&self, content: &str, file_path: Option<&str>) -> ParsedLog {
        let events = group_by_header(content, &HEADER)
            .into_iter()
            .map(|rec| {
                let message = rec.group("message").trim().to_string();
                let timestamp_raw = rec.group("timestamp").to_string();
                let family = if message.contains("destroyed") {
                    "return_to_destroyed_pool"
                } else {
                    "other"
                };
                LogEvent {
                    log_type: LogType::ObjectPool,
                    timestamp: normalize_timestamp(&timestamp_raw),
                    timestamp_raw,
                    version: optional(rec.group("version")),
                    level: Some(LogLevel::Error),
                    component: LogType::ObjectPool.as_str(),
                    event_family: family.to_string(),
                    fields: EventFields::ObjectPool(ObjectPoolFields {
                        asset_id: rec.group("assetId").to_string(),
                    }),
                    continuation: continuation_of(rec.continuation),
                    message,
                }
            })
            .collect();

        ParsedLog::assemble(LogType::ObjectPool, events, file_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_destroyed_pool_return() {
        let line =
            "2025-12-08 15:50:00.000|1.0.0.2|Error|objectPool|assets/prefab_shell.bundle|Returning object to destroyed pool";
        let result = ObjectPoolLogs.parse(line, None);
        let event = &result.events[0];
        assert_eq!(event.event_family, "return_to_destroyed_pool");
        match &event.fields {
            EventFields::ObjectPool(f) => {
                assert_eq!(f.asset_id, "assets/prefab_shell.bundle")
            }
            other => panic!("unexpected fields: {other:?}"),
        }
    }

    #[test]
    fn test_non_destroyed_message_is_other() {
        let line = "2025-12-08 15:50:01.000|1.0.0.2|Error|objectPool|assets/x.bundle|Pool exhausted";
        let result = ObjectPoolLogs.parse(line, None);
        assert_eq!(result.events[0].event_family, "other");
    }
}
