//! Application log classifier: bootstrap, GC, config, anti-cheat,
//! instrumentation and matchmaking progress lines.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{continuation_of, group_num, group_string, optional};
use crate::fields::{ApplicationFields, EventFields};
use crate::grouper::group_by_header;
use crate::model::{LogEvent, LogLevel, LogType, ParsedLog};
use crate::registry::LogClassifier;
use crate::timefmt::normalize_timestamp;

static HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?P<timestamp>\d{4}-\d{2}-\d{2} [^|]+)\|(?P<version>[^|]*)\|(?P<level>[^|]*)\|application\|(?P<message>.*)$",
    )
    .unwrap()
});

static PROFILE_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"ProfileId[:\s]+(\S+)").unwrap());
static ACCOUNT_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"AccountId[:\s]+(\S+)").unwrap());
static GROUP_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)group id[:\s]+(\S+)").unwrap());
static SCENE_PRESET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)scene preset(?: path)?[:\s]+([^\s]+)").unwrap());
static METRIC_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"TRACE-NetworkGameMatching\s+([A-Z])").unwrap());
// "LocationLoaded:8.63 real:10.98 diff:2.34"
// "GameRunned:176.14(2.13) real:183.59(5.33) diff:7.44"
static MATCH_TIMING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(\w+):(\d+(?:\.\d+)?)(?:\((\d+(?:\.\d+)?)\))?\s+real:(\d+(?:\.\d+)?)(?:\((\d+(?:\.\d+)?)\))?\s+diff:(\d+(?:\.\d+)?)",
    )
    .unwrap()
});

const MATCHMAKING_PREFIXES: [&str; 9] = [
    "SelectProfile",
    "Matching with group id",
    "GameCreated",
    "GamePrepared",
    "PlayerSpawnEvent",
    "GamePooled",
    "GameRunned",
    "LocationLoaded",
    "MatchingCompleted",
];

pub struct ApplicationLogs;

impl LogClassifier for ApplicationLogs {
    fn log_type(&self) -> LogType {
        LogType::Application
    }

    fn parse(&self, content: &str, file_path: Option<&str>) -> ParsedLog {
        let events = group_by_header(content, &HEADER)
            .into_iter()
            .map(|rec| {
                let message = rec.group("message").trim().to_string();
                let timestamp_raw = rec.group("timestamp").to_string();
                LogEvent {
                    log_type: LogType::Application,
                    timestamp: normalize_timestamp(&timestamp_raw),
                    timestamp_raw,
                    version: optional(rec.group("version")),
                    level: LogLevel::parse(rec.group("level")),
                    component: LogType::Application.as_str(),
                    event_family: classify(&message).to_string(),
                    fields: EventFields::Application(extract_fields(&message)),
                    continuation: continuation_of(rec.continuation),
                    message,
                }
            })
            .collect();

        ParsedLog::assemble(LogType::Application, events, file_path)
    }
}

fn classify(message: &str) -> &'static str {
    let lower = message.to_lowercase();

    if message.starts_with("Application awaken") || message.starts_with("Assert.raiseExceptions") {
        return "bootstrap";
    }
    if message.starts_with("GC") {
        return "gc";
    }
    if message.starts_with("Config entry") {
        return "config";
    }
    if message.starts_with("BattlEye environment validation failed") {
        return "error";
    }
    if lower.contains("battleye") || message.contains("BEClient") {
        return "anticheat";
    }
    if message.starts_with("ClientMetricsEvents") || message.starts_with("TRACE-NetworkGameMatching")
    {
        return "instrumentation";
    }
    if MATCHMAKING_PREFIXES.iter().any(|p| message.starts_with(p)) {
        return "matchmaking";
    }
    "other"
}

fn extract_fields(message: &str) -> ApplicationFields {
    let mut fields = ApplicationFields {
        profile_id: PROFILE_ID.captures(message).and_then(|c| group_string(&c, 1)),
        account_id: ACCOUNT_ID.captures(message).and_then(|c| group_string(&c, 1)),
        group_id: GROUP_ID.captures(message).and_then(|c| group_string(&c, 1)),
        scene_preset: SCENE_PRESET.captures(message).and_then(|c| group_string(&c, 1)),
        battl_eye_action: message
            .split_once("BEClient")
            .map(|(_, tail)| tail.trim().to_string())
            .filter(|s| !s.is_empty()),
        metric_code: METRIC_CODE.captures(message).and_then(|c| group_string(&c, 1)),
        ..Default::default()
    };

    if let Some(caps) = MATCH_TIMING.captures(message) {
        fields.matchmaking_event = group_string(&caps, 1);
        fields.game_time = group_num(&caps, 2);
        fields.game_step_time = group_num(&caps, 3);
        fields.real_time = group_num(&caps, 4);
        fields.real_step_time = group_num(&caps, 5);
        fields.time_diff = group_num(&caps, 6);
    }

    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOOTSTRAP: &str =
        "2025-12-08 15:01:51.519|1.0.0.2.42157|Info|application|Application awaken, updateQueue:'Update'";

    #[test]
    fn test_bootstrap_header_example() {
        let result = ApplicationLogs.parse(BOOTSTRAP, None);
        assert_eq!(result.events.len(), 1);
        let event = &result.events[0];
        assert_eq!(event.event_family, "bootstrap");
        assert_eq!(event.level, Some(LogLevel::Info));
        assert_eq!(event.version.as_deref(), Some("1.0.0.2.42157"));
        assert_eq!(event.timestamp, "2025-12-08T15:01:51.519Z");
    }

    #[test]
    fn test_matchmaking_timing_extraction() {
        let line =
            "2025-12-08 15:10:00.000|1.0.0.2|Info|application|GameRunned:176.14(2.13) real:183.59(5.33) diff:7.44";
        let result = ApplicationLogs.parse(line, None);
        let event = &result.events[0];
        assert_eq!(event.event_family, "matchmaking");
        match &event.fields {
            EventFields::Application(f) => {
                assert_eq!(f.matchmaking_event.as_deref(), Some("GameRunned"));
                assert_eq!(f.game_time, Some(176.14));
                assert_eq!(f.game_step_time, Some(2.13));
                assert_eq!(f.real_time, Some(183.59));
                assert_eq!(f.real_step_time, Some(5.33));
                assert_eq!(f.time_diff, Some(7.44));
            }
            other => panic!("unexpected fields: {other:?}"),
        }
    }

    #[test]
    fn test_short_timing_without_steps() {
        let line =
            "2025-12-08 15:10:00.000|1.0.0.2|Info|application|LocationLoaded:8.63 real:10.98 diff:2.34";
        let result = ApplicationLogs.parse(line, None);
        match &result.events[0].fields {
            EventFields::Application(f) => {
                assert_eq!(f.matchmaking_event.as_deref(), Some("LocationLoaded"));
                assert_eq!(f.game_time, Some(8.63));
                assert_eq!(f.game_step_time, None);
            }
            other => panic!("unexpected fields: {other:?}"),
        }
    }

    #[test]
    fn test_anticheat_and_group_id() {
        let line = "2025-12-08 15:02:00.000|1.0.0.2|Info|application|BEClient initialized";
        let result = ApplicationLogs.parse(line, None);
        assert_eq!(result.events[0].event_family, "anticheat");

        let line = "2025-12-08 15:03:00.000|1.0.0.2|Info|application|Matching with group id: abc123";
        let result = ApplicationLogs.parse(line, None);
        let event = &result.events[0];
        assert_eq!(event.event_family, "matchmaking");
        match &event.fields {
            EventFields::Application(f) => assert_eq!(f.group_id.as_deref(), Some("abc123")),
            other => panic!("unexpected fields: {other:?}"),
        }
    }

    #[test]
    fn test_unmatched_message_is_other() {
        let line = "2025-12-08 15:04:00.000|1.0.0.2|Debug|application|Some unrelated chatter";
        let result = ApplicationLogs.parse(line, None);
        assert_eq!(result.events[0].event_family, "other");
    }

    #[test]
    fn test_battleye_validation_failure_is_error() {
        let line =
            "2025-12-08 15:05:00.000|1.0.0.2|Error|application|BattlEye environment validation failed";
        let result = ApplicationLogs.parse(line, None);
        assert_eq!(result.events[0].event_family, "error");
    }
}
