//! Seasons classifier. The client only routes one failure shape here.

use once_cell::sync::Lazy;
use regex::Regex;

use super::optional;
use crate::fields::EventFields;
use crate::grouper::group_by_header;
use crate::model::{LogEvent, LogLevel, LogType, ParsedLog};
use crate::registry::LogClassifier;
use crate::timefmt::normalize_timestamp;

static HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?P<timestamp>\d{4}-\d{2}-\d{2} [^|]+)\|(?P<version>[^|]*)\|Error\|seasons\|(?P<message>.*)$",
    )
    .unwrap()
});

pub struct SeasonsLogs;

impl LogClassifier for SeasonsLogs {
    fn log_type(&self) -> LogType {
        LogType::Seasons
    }

    fn parse(&self, content: &str, file_path: Option<&str>) -> ParsedLog {
        let events = group_by_header(content, &HEADER)
            .into_iter()
            .map(|rec| {
                let message = rec.group("message").trim().to_string();
                let timestamp_raw = rec.group("timestamp").to_string();
                LogEvent {
                    log_type: LogType::Seasons,
                    timestamp: normalize_timestamp(&timestamp_raw),
                    timestamp_raw,
                    version: optional(rec.group("version")),
                    level: Some(LogLevel::Error),
                    component: LogType::Seasons.as_str(),
                    event_family: "seasons_materials_fixer_missing".to_string(),
                    fields: EventFields::None,
                    continuation: None,
                    message,
                }
            })
            .collect();

        ParsedLog::assemble(LogType::Seasons, events, file_path)
    }
}
