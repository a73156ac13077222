//! Network message metrics classifier. Each record is a `|`-separated
//! `key:value` sample line.

use once_cell::sync::Lazy;
use regex::Regex;

use super::optional;
use crate::fields::{EventFields, NetworkMessagesFields};
use crate::grouper::group_by_header;
use crate::model::{LogEvent, LogLevel, LogType, ParsedLog};
use crate::registry::LogClassifier;
use crate::timefmt::normalize_timestamp;

static HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?P<timestamp>\d{4}-\d{2}-\d{2} [^|]+)\|(?P<version>[^|]*)\|Info\|network-messages\|(?P<metrics>.*)$",
    )
    .unwrap()
});

pub struct NetworkMessagesLogs;

impl LogClassifier for NetworkMessagesLogs {
    fn log_type(&self) -> LogType {
        LogType::NetworkMessages
    }

    fn parse(&self, content: &str, file_path: Option<&str>) -> ParsedLog {
        let events = group_by_header(content, &HEADER)
            .into_iter()
            .map(|rec| {
                let metrics = rec.group("metrics").trim().to_string();
                let timestamp_raw = rec.group("timestamp").to_string();
                LogEvent {
                    log_type: LogType::NetworkMessages,
                    timestamp: normalize_timestamp(&timestamp_raw),
                    timestamp_raw,
                    version: optional(rec.group("version")),
                    level: Some(LogLevel::Info),
                    component: LogType::NetworkMessages.as_str(),
                    event_family: "metrics".to_string(),
                    fields: EventFields::NetworkMessages(parse_metrics(&metrics)),
                    continuation: None,
                    message: metrics,
                }
            })
            .collect();

        ParsedLog::assemble(LogType::NetworkMessages, events, file_path)
    }
}

fn parse_metrics(metrics: &str) -> NetworkMessagesFields {
    let mut fields = NetworkMessagesFields::default();
    for part in metrics.split('|') {
        let Some((key, value)) = part.split_once(':') else {
            continue;
        };
        let value: Option<f64> = value.trim().parse().ok();
        match key.trim() {
            "rpi" => fields.rpi = value,
            "rwi" => fields.rwi = value,
            "rsi" => fields.rsi = value,
            "rci" => fields.rci = value,
            "ui" => fields.ui = value,
            "lui" => fields.lui = value,
            "lud" => fields.lud = value,
            _ => {}
        }
    }
    fields
}
