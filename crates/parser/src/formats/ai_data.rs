//! AI data classifier: wave-count and door-link integrity errors.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{group_string, optional};
use crate::fields::{AiDataFields, EventFields};
use crate::grouper::group_by_header;
use crate::model::{LogEvent, LogLevel, LogType, ParsedLog};
use crate::registry::LogClassifier;
use crate::timefmt::normalize_timestamp;

static HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?P<timestamp>\d{4}-\d{2}-\d{2} [^|]+)\|(?P<version>[^|]*)\|Error\|aiData\|(?P<message>.*)$",
    )
    .unwrap()
});

static DOOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"Door without link\s+(.*)").unwrap());

pub struct AiDataLogs;

impl LogClassifier for AiDataLogs {
    fn log_type(&self) -> LogType {
        LogType::AiData
    }

    fn parse(&self, content: &str, file_path: Option<&str>) -> ParsedLog {
        let events = group_by_header(content, &HEADER)
            .into_iter()
            .map(|rec| {
                let message = rec.group("message").trim().to_string();
                let timestamp_raw = rec.group("timestamp").to_string();
                let (family, fields) = classify(&message);
                LogEvent {
                    log_type: LogType::AiData,
                    timestamp: normalize_timestamp(&timestamp_raw),
                    timestamp_raw,
                    version: optional(rec.group("version")),
                    level: Some(LogLevel::Error),
                    component: LogType::AiData.as_str(),
                    event_family: family.to_string(),
                    fields: EventFields::AiData(fields),
                    continuation: None,
                    message,
                }
            })
            .collect();

        ParsedLog::assemble(LogType::AiData, events, file_path)
    }
}

fn classify(message: &str) -> (&'static str, AiDataFields) {
    if message.starts_with("Wrong count of all simple waves") {
        return ("wrong_wave_count", AiDataFields::default());
    }
    if message.starts_with("Door without link") {
        let fields = AiDataFields {
            door_name: DOOR.captures(message).and_then(|c| group_string(&c, 1)),
        };
        return ("door_without_link", fields);
    }
    ("other", AiDataFields::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_door_without_link() {
        let line = "2025-12-08 15:09:00.000|1.0.0.2|Error|aiData|Door without link door_factory_12";
        let result = AiDataLogs.parse(line, None);
        let event = &result.events[0];
        assert_eq!(event.event_family, "door_without_link");
        match &event.fields {
            EventFields::AiData(f) => assert_eq!(f.door_name.as_deref(), Some("door_factory_12")),
            other => panic!("unexpected fields: {other:?}"),
        }
    }

    #[test]
    fn test_wave_count() {
        let line =
            "2025-12-08 15:09:01.000|1.0.0.2|Error|aiData|Wrong count of all simple waves on location";
        let result = AiDataLogs.parse(line, None);
        assert_eq!(result.events[0].event_family, "wrong_wave_count");
    }
}
