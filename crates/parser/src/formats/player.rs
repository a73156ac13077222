//! Player log classifier: missing item / missing address errors.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{group_string, optional};
use crate::fields::{EventFields, PlayerFields};
use crate::grouper::group_by_header;
use crate::model::{LogEvent, LogLevel, LogType, ParsedLog};
use crate::registry::LogClassifier;
use crate::timefmt::normalize_timestamp;

static HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?P<timestamp>\d{4}-\d{2}-\d{2} [^|]+)\|(?P<version>[^|]*)\|Error\|player\|(?P<message>.*)$",
    )
    .unwrap()
});

static ITEM_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"id:\s*([0-9a-fA-F]+)").unwrap());
static PARENT_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"ParentId:\s*([0-9a-fA-F]+)").unwrap());
static CONTAINER_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"ContainerId:\s*([^\s]+)").unwrap());

pub struct PlayerLogs;

impl LogClassifier for PlayerLogs {
    fn log_type(&self) -> LogType {
        LogType::Player
    }

    fn parse(&self, content: &str, file_path: Option<&str>) -> ParsedLog {
        let events = group_by_header(content, &HEADER)
            .into_iter()
            .map(|rec| {
                let message = rec.group("message").trim().to_string();
                let timestamp_raw = rec.group("timestamp").to_string();
                let (family, fields) = classify(&message);
                LogEvent {
                    log_type: LogType::Player,
                    timestamp: normalize_timestamp(&timestamp_raw),
                    timestamp_raw,
                    version: optional(rec.group("version")),
                    level: Some(LogLevel::Error),
                    component: LogType::Player.as_str(),
                    event_family: family.to_string(),
                    fields: EventFields::Player(fields),
                    continuation: None,
                    message,
                }
            })
            .collect();

        ParsedLog::assemble(LogType::Player, events, file_path)
    }
}

fn classify(message: &str) -> (&'static str, PlayerFields) {
    if message.starts_with("Could not find item with id") {
        let fields = PlayerFields {
            item_id: ITEM_ID.captures(message).and_then(|c| group_string(&c, 1)),
            ..Default::default()
        };
        return ("missing_item", fields);
    }
    if message.starts_with("Could not find item address") {
        let fields = PlayerFields {
            parent_id: PARENT_ID.captures(message).and_then(|c| group_string(&c, 1)),
            container_id: CONTAINER_ID.captures(message).and_then(|c| group_string(&c, 1)),
            ..Default::default()
        };
        return ("missing_address", fields);
    }
    ("other", PlayerFields::default())
}
