//! Inventory rejection classifier. The header carries the profile and the
//! server verdict; the continuation block (`Item:` / `From:` / `To:` /
//! `Reason:`) carries the operation detail.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{continuation_of, group_num, group_string, optional};
use crate::fields::{EventFields, GridAddress, InventoryFields, WorldPosition};
use crate::grouper::group_by_header;
use crate::model::{LogEvent, LogLevel, LogType, ParsedLog};
use crate::registry::LogClassifier;
use crate::timefmt::normalize_timestamp;

static HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?P<timestamp>\d{4}-\d{2}-\d{2} [^|]+)\|(?P<version>[^|]*)\|Error\|inventory\|(?P<message>.*)$",
    )
    .unwrap()
});

static PROFILE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[(?P<profile>[^\]|]+)\|(?P<user>[^\]|]+)\|Profile\]").unwrap());
static CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)rejected by server:\s*(\d+)").unwrap());
static OPERATION: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)OperationType:\s*([^,]+)").unwrap());
static OWNER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)Owner:\s*([^\s,]+)").unwrap());

static ITEM_TPL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Item:\s*([^\s]+)\s+([0-9a-fA-F]+)").unwrap());
static ITEM_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"ID:\s*([0-9a-fA-F]+)").unwrap());
static ITEM_ADDRESS: Lazy<Regex> = Lazy::new(|| Regex::new(r"Address:\s*([^,]+),").unwrap());
static GRID: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)grid\s+(\d+)").unwrap());
static SLOT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)slot:\s*([^)]+)").unwrap());
static COORDS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)at\s*\(x:\s*([-\d.]+),\s*y:\s*([-\d.]+),\s*r:\s*([^)]+)\)").unwrap()
});
static WORLD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\(\s*([-\d.]+),\s*([-\d.]+),\s*([-\d.]+)\)").unwrap());

pub struct InventoryLogs;

impl LogClassifier for InventoryLogs {
    fn log_type(&self) -> LogType {
        LogType::Inventory
    }

    fn parse(&self, content: &str, file_path: Option<&str>) -> ParsedLog {
        let events = group_by_header(content, &HEADER)
            .into_iter()
            .map(|rec| {
                let message = rec.group("message").trim().to_string();
                let timestamp_raw = rec.group("timestamp").to_string();
                let mut fields = parse_header(&message);
                parse_continuation(&rec.continuation, &mut fields);
                LogEvent {
                    log_type: LogType::Inventory,
                    timestamp: normalize_timestamp(&timestamp_raw),
                    timestamp_raw,
                    version: optional(rec.group("version")),
                    level: Some(LogLevel::Error),
                    component: LogType::Inventory.as_str(),
                    event_family: "rejection".to_string(),
                    fields: EventFields::Inventory(Box::new(fields)),
                    continuation: continuation_of(rec.continuation),
                    message,
                }
            })
            .collect();

        ParsedLog::assemble(LogType::Inventory, events, file_path)
    }
}

fn parse_header(message: &str) -> InventoryFields {
    InventoryFields {
        profile_id: PROFILE
            .captures(message)
            .and_then(|c| c.name("profile").map(|m| m.as_str().to_string())),
        username: PROFILE
            .captures(message)
            .and_then(|c| c.name("user").map(|m| m.as_str().to_string())),
        code: CODE.captures(message).and_then(|c| group_num(&c, 1)),
        operation_type: OPERATION.captures(message).and_then(|c| group_string(&c, 1)),
        owner: OWNER.captures(message).and_then(|c| group_string(&c, 1)),
        ..Default::default()
    }
}

fn parse_continuation(lines: &[String], fields: &mut InventoryFields) {
    for line in lines {
        let trimmed = line.trim();
        if trimmed.starts_with("Item:") {
            fields.tpl = ITEM_TPL.captures(line).and_then(|c| group_string(&c, 1));
            fields.item_id = ITEM_ID.captures(line).and_then(|c| group_string(&c, 1));
            fields.address = ITEM_ADDRESS.captures(line).and_then(|c| group_string(&c, 1));
        } else if trimmed.starts_with("From:") {
            fields.from = Some(trimmed.trim_start_matches("From:").trim().to_string());
        } else if trimmed.starts_with("To:") {
            let without_prefix = trimmed.trim_start_matches("To:").trim();
            fields.to = Some(
                without_prefix
                    .split(" at ")
                    .next()
                    .unwrap_or(without_prefix)
                    .trim()
                    .to_string(),
            );
            let coords = COORDS.captures(line);
            fields.grid = Some(GridAddress {
                x: coords.as_ref().and_then(|c| group_num(c, 1)),
                y: coords.as_ref().and_then(|c| group_num(c, 2)),
                r: coords.as_ref().and_then(|c| group_string(c, 3)),
                slot: GRID
                    .captures(line)
                    .and_then(|c| group_string(&c, 1))
                    .map(|n| format!("grid {n}"))
                    .or_else(|| SLOT.captures(line).and_then(|c| group_string(&c, 1))),
            });
        } else if trimmed.starts_with("Reason:") {
            let reason = trimmed.trim_start_matches("Reason:").trim().to_string();
            if let Some(caps) = WORLD.captures(&reason) {
                fields.world_position = Some(WorldPosition {
                    x: group_num(&caps, 1).unwrap_or(0.0),
                    y: group_num(&caps, 2).unwrap_or(0.0),
                    z: group_num(&caps, 3).unwrap_or(0.0),
                });
            }
            fields.reason = Some(reason);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REJECTION: &str = "2025-12-08 15:30:00.000|1.0.0.2|Error|inventory|[68b1f2cd|PMC Oskar|Profile] Operation rejected by server: 228, OperationType: Move, Owner: profile\n\
        Item: med_salewa 5755356824597772cb798962, ID: 68b1f2cd0000000000000001, Address: hideout stash, owner\n\
        From: stash grid 0\n\
        To: backpack at (x: 2, y: 1, r: Horizontal)\n\
        Reason: Space is occupied at (12.5, -3.25, 8.0)\n";

    #[test]
    fn test_header_fields_extracted() {
        let result = InventoryLogs.parse(REJECTION, None);
        assert_eq!(result.events.len(), 1);
        let event = &result.events[0];
        assert_eq!(event.event_family, "rejection");
        match &event.fields {
            EventFields::Inventory(f) => {
                assert_eq!(f.profile_id.as_deref(), Some("68b1f2cd"));
                assert_eq!(f.username.as_deref(), Some("PMC Oskar"));
                assert_eq!(f.code, Some(228));
                assert_eq!(f.operation_type.as_deref(), Some("Move"));
                assert_eq!(f.owner.as_deref(), Some("profile"));
            }
            other => panic!("unexpected fields: {other:?}"),
        }
    }

    #[test]
    fn test_continuation_block_extracted() {
        let result = InventoryLogs.parse(REJECTION, None);
        match &result.events[0].fields {
            EventFields::Inventory(f) => {
                assert_eq!(f.tpl.as_deref(), Some("med_salewa"));
                assert_eq!(f.item_id.as_deref(), Some("68b1f2cd0000000000000001"));
                assert_eq!(f.address.as_deref(), Some("hideout stash"));
                assert_eq!(f.from.as_deref(), Some("stash grid 0"));
                assert_eq!(f.to.as_deref(), Some("backpack"));
                let grid = f.grid.as_ref().unwrap();
                assert_eq!(grid.x, Some(2.0));
                assert_eq!(grid.y, Some(1.0));
                assert_eq!(grid.r.as_deref(), Some("Horizontal"));
                let world = f.world_position.as_ref().unwrap();
                assert_eq!(world.x, 12.5);
                assert_eq!(world.z, 8.0);
                assert!(f.reason.as_deref().unwrap().starts_with("Space is occupied"));
            }
            other => panic!("unexpected fields: {other:?}"),
        }
    }
}
