//! Output log classifier. This log is a mixed bag of forwarded component
//! chatter, so the family set is open: the `|`-prefixed component hint when
//! present, else a message prefix.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{continuation_of, optional};
use crate::fields::{EventFields, OutputFields};
use crate::grouper::group_by_header;
use crate::model::{LogEvent, LogLevel, LogType, ParsedLog};
use crate::registry::LogClassifier;
use crate::timefmt::normalize_timestamp;

static HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?P<timestamp>\d{4}-\d{2}-\d{2} [^|]+)\|(?P<version>[^|]*)\|(?P<level>[^|]*)\|output\|(?P<message>.*)$",
    )
    .unwrap()
});

pub struct OutputLogs;

impl LogClassifier for OutputLogs {
    fn log_type(&self) -> LogType {
        LogType::Output
    }

    fn parse(&self, content: &str, file_path: Option<&str>) -> ParsedLog {
        let events = group_by_header(content, &HEADER)
            .into_iter()
            .map(|rec| {
                let message = rec.group("message").trim().to_string();
                let timestamp_raw = rec.group("timestamp").to_string();
                let (family, hint) = classify(&message);
                LogEvent {
                    log_type: LogType::Output,
                    timestamp: normalize_timestamp(&timestamp_raw),
                    timestamp_raw,
                    version: optional(rec.group("version")),
                    level: LogLevel::parse(rec.group("level")),
                    component: LogType::Output.as_str(),
                    event_family: family,
                    fields: EventFields::Output(OutputFields {
                        component_hint: hint,
                    }),
                    continuation: continuation_of(rec.continuation),
                    message,
                }
            })
            .collect();

        ParsedLog::assemble(LogType::Output, events, file_path)
    }
}

fn classify(message: &str) -> (String, Option<String>) {
    let hint = message
        .split_once('|')
        .map(|(prefix, _)| prefix.to_string());
    let family = match &hint {
        Some(prefix) => prefix.clone(),
        None => message.chars().take(40).collect(),
    };
    (family, hint)
}
