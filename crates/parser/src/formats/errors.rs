//! Canonical errors-log classifier. This log aggregates error events from
//! every component, so it is the single source for system-wide error totals.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{continuation_of, optional};
use crate::fields::EventFields;
use crate::grouper::group_by_header;
use crate::model::{LogEvent, LogLevel, LogType, ParsedLog};
use crate::registry::LogClassifier;
use crate::timefmt::normalize_timestamp;

static HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?P<timestamp>\d{4}-\d{2}-\d{2} [^|]+)\|(?P<version>[^|]*)\|Error\|errors\|(?P<message>.*)$",
    )
    .unwrap()
});

pub struct ErrorsLogs;

impl LogClassifier for ErrorsLogs {
    fn log_type(&self) -> LogType {
        LogType::Errors
    }

    fn parse(&self, content: &str, file_path: Option<&str>) -> ParsedLog {
        let events = group_by_header(content, &HEADER)
            .into_iter()
            .map(|rec| {
                let message = rec.group("message").trim().to_string();
                let timestamp_raw = rec.group("timestamp").to_string();
                LogEvent {
                    log_type: LogType::Errors,
                    timestamp: normalize_timestamp(&timestamp_raw),
                    timestamp_raw,
                    version: optional(rec.group("version")),
                    level: Some(LogLevel::Error),
                    component: LogType::Errors.as_str(),
                    event_family: classify(&message).to_string(),
                    fields: EventFields::None,
                    continuation: continuation_of(rec.continuation),
                    message,
                }
            })
            .collect();

        ParsedLog::assemble(LogType::Errors, events, file_path)
    }
}

fn classify(message: &str) -> &'static str {
    let lower = message.to_lowercase();

    if message.starts_with("Mip 0 waiting timeout") {
        return "mip_timeout";
    }
    if message.starts_with("NullReferenceException") {
        return "null_reference";
    }
    if message.starts_with("KeyNotFoundException") {
        return "key_not_found";
    }
    if message.starts_with("Can't find lamp with netId") {
        return "missing_lamp";
    }
    if message.contains("Cant find counter for Quest") {
        return "missing_quest_counter";
    }
    if lower.starts_with("seasons|") {
        return "seasons";
    }
    if lower.contains("trying to add duplicate") {
        return "locale_duplicate";
    }
    if lower.contains("incorrect enum value") {
        return "enum_fallback";
    }
    if lower.contains("serialization layout") {
        return "serialization_layout";
    }
    if lower.contains("supplydata is null") {
        return "supply_data_null";
    }
    if lower.starts_with("spatial-audio|") {
        return "spatial_audio";
    }
    if lower.contains("try to load null resource") {
        return "resource_null";
    }
    if lower.contains("already registered object") {
        return "duplicate_object";
    }
    if lower.starts_with("insurance|") {
        return "insurance";
    }
    if lower.starts_with("aidata|") {
        return "ai";
    }
    if lower.starts_with("player|") {
        return "player";
    }
    "other"
}
