//! Insurance classifier. Only warn/error records reach this log.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{group_string, optional};
use crate::fields::{EventFields, InsuranceFields};
use crate::grouper::group_by_header;
use crate::model::{LogEvent, LogLevel, LogType, ParsedLog};
use crate::registry::LogClassifier;
use crate::timefmt::normalize_timestamp;

static HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?P<timestamp>\d{4}-\d{2}-\d{2} [^|]+)\|(?P<version>[^|]*)\|(?P<level>Warn|Error)\|insurance\|(?P<message>.*)$",
    )
    .unwrap()
});

static MISSING_ITEM: Lazy<Regex> = Lazy::new(|| Regex::new(r"contain:\s*(.*)$").unwrap());
static INSURING_ITEM: Lazy<Regex> = Lazy::new(|| Regex::new(r"\((.*)\)").unwrap());

pub struct InsuranceLogs;

impl LogClassifier for InsuranceLogs {
    fn log_type(&self) -> LogType {
        LogType::Insurance
    }

    fn parse(&self, content: &str, file_path: Option<&str>) -> ParsedLog {
        let events = group_by_header(content, &HEADER)
            .into_iter()
            .map(|rec| {
                let message = rec.group("message").trim().to_string();
                let timestamp_raw = rec.group("timestamp").to_string();
                let (family, fields) = classify(&message);
                LogEvent {
                    log_type: LogType::Insurance,
                    timestamp: normalize_timestamp(&timestamp_raw),
                    timestamp_raw,
                    version: optional(rec.group("version")),
                    level: LogLevel::parse(rec.group("level")),
                    component: LogType::Insurance.as_str(),
                    event_family: family.to_string(),
                    fields: EventFields::Insurance(fields),
                    continuation: None,
                    message,
                }
            })
            .collect();

        ParsedLog::assemble(LogType::Insurance, events, file_path)
    }
}

fn classify(message: &str) -> (&'static str, InsuranceFields) {
    if message.starts_with("Items to insure does not contain") {
        let fields = InsuranceFields {
            item_name: MISSING_ITEM.captures(message).and_then(|c| group_string(&c, 1)),
        };
        return ("warn_missing_item", fields);
    }
    if message.starts_with("Error insuring item") {
        let fields = InsuranceFields {
            item_name: INSURING_ITEM.captures(message).and_then(|c| group_string(&c, 1)),
        };
        return ("error_insuring", fields);
    }
    ("other", InsuranceFields::default())
}
