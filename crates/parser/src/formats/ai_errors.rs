//! AI errors classifier. Same rule set as the AI data log, plus a source
//! field the header inserts between component and message.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{group_string, optional};
use crate::fields::{AiErrorsFields, EventFields};
use crate::grouper::group_by_header;
use crate::model::{LogEvent, LogLevel, LogType, ParsedLog};
use crate::registry::LogClassifier;
use crate::timefmt::normalize_timestamp;

static HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?P<timestamp>\d{4}-\d{2}-\d{2} [^|]+)\|(?P<version>[^|]*)\|Error\|aiErrors\|(?P<source>[^|]*)\|(?P<message>.*)$",
    )
    .unwrap()
});

static DOOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"Door without link\s+(.*)").unwrap());

pub struct AiErrorsLogs;

impl LogClassifier for AiErrorsLogs {
    fn log_type(&self) -> LogType {
        LogType::AiErrors
    }

    fn parse(&self, content: &str, file_path: Option<&str>) -> ParsedLog {
        let events = group_by_header(content, &HEADER)
            .into_iter()
            .map(|rec| {
                let message = rec.group("message").trim().to_string();
                let timestamp_raw = rec.group("timestamp").to_string();
                let (family, door_name) = classify(&message);
                LogEvent {
                    log_type: LogType::AiErrors,
                    timestamp: normalize_timestamp(&timestamp_raw),
                    timestamp_raw,
                    version: optional(rec.group("version")),
                    level: Some(LogLevel::Error),
                    component: LogType::AiErrors.as_str(),
                    event_family: family.to_string(),
                    fields: EventFields::AiErrors(AiErrorsFields {
                        source: rec.group("source").to_string(),
                        door_name,
                    }),
                    continuation: None,
                    message,
                }
            })
            .collect();

        ParsedLog::assemble(LogType::AiErrors, events, file_path)
    }
}

fn classify(message: &str) -> (&'static str, Option<String>) {
    if message.starts_with("Wrong count of all simple waves") {
        return ("wrong_wave_count", None);
    }
    if message.starts_with("Door without link") {
        return (
            "door_without_link",
            DOOR.captures(message).and_then(|c| group_string(&c, 1)),
        );
    }
    ("other", None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_field_preserved() {
        let line =
            "2025-12-08 15:09:30.000|1.0.0.2|Error|aiErrors|BotSpawner|Wrong count of all simple waves on location";
        let result = AiErrorsLogs.parse(line, None);
        let event = &result.events[0];
        assert_eq!(event.event_family, "wrong_wave_count");
        match &event.fields {
            EventFields::AiErrors(f) => assert_eq!(f.source, "BotSpawner"),
            other => panic!("unexpected fields: {other:?}"),
        }
    }

    #[test]
    fn test_door_name_extracted() {
        let line =
            "2025-12-08 15:09:31.000|1.0.0.2|Error|aiErrors|DoorChecker|Door without link door_shoreline_4";
        let result = AiErrorsLogs.parse(line, None);
        match &result.events[0].fields {
            EventFields::AiErrors(f) => {
                assert_eq!(f.door_name.as_deref(), Some("door_shoreline_4"))
            }
            other => panic!("unexpected fields: {other:?}"),
        }
    }
}
