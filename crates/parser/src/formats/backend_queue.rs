//! Backend queue failure classifier. The continuation is a JSON array of the
//! commands that were in flight; malformed JSON degrades to an empty list.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{continuation_of, optional};
use crate::fields::{BackendQueueFields, EventFields, QueueCommand};
use crate::grouper::group_by_header;
use crate::model::{LogEvent, LogLevel, LogType, ParsedLog};
use crate::registry::LogClassifier;
use crate::timefmt::normalize_timestamp;

static HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?P<timestamp>\d{4}-\d{2}-\d{2} [^|]+)\|(?P<version>[^|]*)\|Error\|backend_queue\|(?P<message>.*)$",
    )
    .unwrap()
});

pub struct BackendQueueLogs;

impl LogClassifier for BackendQueueLogs {
    fn log_type(&self) -> LogType {
        LogType::BackendQueue
    }

    fn parse(&self, content: &str, file_path: Option<&str>) -> ParsedLog {
        let events = group_by_header(content, &HEADER)
            .into_iter()
            .map(|rec| {
                let message = rec.group("message").trim().to_string();
                let timestamp_raw = rec.group("timestamp").to_string();
                let commands = parse_commands(&rec.continuation);
                LogEvent {
                    log_type: LogType::BackendQueue,
                    timestamp: normalize_timestamp(&timestamp_raw),
                    timestamp_raw,
                    version: optional(rec.group("version")),
                    level: Some(LogLevel::Error),
                    component: LogType::BackendQueue.as_str(),
                    event_family: "queue_failure".to_string(),
                    fields: EventFields::BackendQueue(BackendQueueFields {
                        commands,
                        resolved_trader: None,
                    }),
                    continuation: continuation_of(rec.continuation),
                    message,
                }
            })
            .collect();

        ParsedLog::assemble(LogType::BackendQueue, events, file_path)
    }
}

fn parse_commands(lines: &[String]) -> Vec<QueueCommand> {
    let text = lines.join("\n");
    if text.trim().is_empty() {
        return Vec::new();
    }
    match serde_json::from_str::<Vec<QueueCommand>>(&text) {
        Ok(commands) => commands,
        Err(err) => {
            tracing::debug!(error = %err, "queue dump is not a command array");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commands_parsed_from_continuation() {
        let content = "2025-12-08 16:00:00.000|1.0.0.2|Error|backend_queue|Queue flush failed\n\
                       [{\"Action\": \"TradingConfirm\", \"trader\": \"54cb50c76803fa8b248b4571\",\n\
                       \"items\": [{\"id\": \"abc\", \"count\": 2}]}]\n";
        let result = BackendQueueLogs.parse(content, None);
        let event = &result.events[0];
        assert_eq!(event.event_family, "queue_failure");
        match &event.fields {
            EventFields::BackendQueue(f) => {
                assert_eq!(f.commands.len(), 1);
                assert_eq!(f.commands[0].action.as_deref(), Some("TradingConfirm"));
                assert_eq!(
                    f.commands[0].trader.as_deref(),
                    Some("54cb50c76803fa8b248b4571")
                );
                assert_eq!(f.commands[0].items.as_ref().unwrap()[0].count, Some(2));
            }
            other => panic!("unexpected fields: {other:?}"),
        }
    }

    #[test]
    fn test_malformed_json_degrades_to_empty() {
        let content = "2025-12-08 16:00:00.000|1.0.0.2|Error|backend_queue|Queue flush failed\n\
                       [{ not json\n";
        let result = BackendQueueLogs.parse(content, None);
        match &result.events[0].fields {
            EventFields::BackendQueue(f) => assert!(f.commands.is_empty()),
            other => panic!("unexpected fields: {other:?}"),
        }
    }

    #[test]
    fn test_no_continuation_means_no_commands() {
        let content = "2025-12-08 16:00:00.000|1.0.0.2|Error|backend_queue|Queue flush failed\n";
        let result = BackendQueueLogs.parse(content, None);
        match &result.events[0].fields {
            EventFields::BackendQueue(f) => assert!(f.commands.is_empty()),
            other => panic!("unexpected fields: {other:?}"),
        }
    }
}
