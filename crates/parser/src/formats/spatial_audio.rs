//! Spatial audio subsystem classifier.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{continuation_of, group_num, group_string, optional};
use crate::fields::{EventFields, SpatialAudioFields};
use crate::grouper::group_by_header;
use crate::model::{LogEvent, LogLevel, LogType, ParsedLog};
use crate::registry::LogClassifier;
use crate::timefmt::normalize_timestamp;

static HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?P<timestamp>\d{4}-\d{2}-\d{2} [^|]+)\|(?P<version>[^|]*)\|(?P<level>[^|]*)\|spatial-audio\|(?P<message>.*)$",
    )
    .unwrap()
});

static QUALITY: Lazy<Regex> = Lazy::new(|| Regex::new(r"=\s*(.*)$").unwrap());
static DSP_LENGTH: Lazy<Regex> = Lazy::new(|| Regex::new(r"length:\s*(\d+)").unwrap());
static DSP_NUM: Lazy<Regex> = Lazy::new(|| Regex::new(r"buffers num:\s*(\d+)").unwrap());
static REVERB_ENABLED: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)enabled:\s*(\w+)").unwrap());
static REVERB_COOLDOWN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)cooldown:\s*([\d.]+)").unwrap());
static RESET_ATTEMPT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)attempt\s*(\d+)").unwrap());

pub struct SpatialAudioLogs;

impl LogClassifier for SpatialAudioLogs {
    fn log_type(&self) -> LogType {
        LogType::SpatialAudio
    }

    fn parse(&self, content: &str, file_path: Option<&str>) -> ParsedLog {
        let events = group_by_header(content, &HEADER)
            .into_iter()
            .map(|rec| {
                let message = rec.group("message").trim().to_string();
                let timestamp_raw = rec.group("timestamp").to_string();
                let (family, fields) = classify(&message);
                LogEvent {
                    log_type: LogType::SpatialAudio,
                    timestamp: normalize_timestamp(&timestamp_raw),
                    timestamp_raw,
                    version: optional(rec.group("version")),
                    level: LogLevel::parse(rec.group("level")),
                    component: LogType::SpatialAudio.as_str(),
                    event_family: family.to_string(),
                    fields: EventFields::SpatialAudio(fields),
                    continuation: continuation_of(rec.continuation),
                    message,
                }
            })
            .collect();

        ParsedLog::assemble(LogType::SpatialAudio, events, file_path)
    }
}

fn classify(message: &str) -> (&'static str, SpatialAudioFields) {
    if message.starts_with("Success initialize BetterAudio") {
        return ("init_success", SpatialAudioFields::default());
    }
    if message.starts_with("SpatialAudioSystem Initialized") {
        return ("system_initialized", SpatialAudioFields::default());
    }
    if message.starts_with("Target audio quality") {
        let fields = SpatialAudioFields {
            quality: QUALITY.captures(message).and_then(|c| group_string(&c, 1)),
            ..Default::default()
        };
        return ("target_quality", fields);
    }
    if message.starts_with("Current DSP buffer length") {
        let fields = SpatialAudioFields {
            dsp_buffer_length: DSP_LENGTH.captures(message).and_then(|c| group_num(&c, 1)),
            dsp_buffers_num: DSP_NUM.captures(message).and_then(|c| group_num(&c, 1)),
            ..Default::default()
        };
        return ("dsp_stats", fields);
    }
    if message.starts_with("ReverbPluginChecker") {
        let fields = SpatialAudioFields {
            reverb_enabled: REVERB_ENABLED
                .captures(message)
                .map(|c| c[1].eq_ignore_ascii_case("true")),
            reverb_cooldown: REVERB_COOLDOWN.captures(message).and_then(|c| group_num(&c, 1)),
            ..Default::default()
        };
        return ("reverb_checker", fields);
    }
    if message.starts_with("Reverb reset attempt") {
        let fields = SpatialAudioFields {
            attempt: RESET_ATTEMPT.captures(message).and_then(|c| group_num(&c, 1)),
            ..Default::default()
        };
        return ("reverb_reset", fields);
    }
    if message.contains("can't init occlusion transform") {
        return ("occlusion_error", SpatialAudioFields::default());
    }
    ("other", SpatialAudioFields::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn family_of(message: &str) -> String {
        let line = format!("2025-12-08 15:08:00.000|1.0.0.2|Info|spatial-audio|{message}");
        SpatialAudioLogs.parse(&line, None).events.remove(0).event_family
    }

    #[test]
    fn test_families() {
        assert_eq!(family_of("Success initialize BetterAudio"), "init_success");
        assert_eq!(family_of("SpatialAudioSystem Initialized"), "system_initialized");
        assert_eq!(
            family_of("[SpatialAudioSystem] can't init occlusion transform for player :"),
            "occlusion_error"
        );
        assert_eq!(family_of("something else"), "other");
    }

    #[test]
    fn test_dsp_stats_fields() {
        let line =
            "2025-12-08 15:08:01.000|1.0.0.2|Info|spatial-audio|Current DSP buffer length: 1024, buffers num: 4";
        let result = SpatialAudioLogs.parse(line, None);
        match &result.events[0].fields {
            EventFields::SpatialAudio(f) => {
                assert_eq!(f.dsp_buffer_length, Some(1024));
                assert_eq!(f.dsp_buffers_num, Some(4));
            }
            other => panic!("unexpected fields: {other:?}"),
        }
    }

    #[test]
    fn test_reverb_checker_fields() {
        let line =
            "2025-12-08 15:08:02.000|1.0.0.2|Info|spatial-audio|ReverbPluginChecker enabled: True, check cooldown: 0.25";
        let result = SpatialAudioLogs.parse(line, None);
        match &result.events[0].fields {
            EventFields::SpatialAudio(f) => {
                assert_eq!(f.reverb_enabled, Some(true));
                assert_eq!(f.reverb_cooldown, Some(0.25));
            }
            other => panic!("unexpected fields: {other:?}"),
        }
    }

    #[test]
    fn test_target_quality_text() {
        let line = "2025-12-08 15:08:03.000|1.0.0.2|Info|spatial-audio|Target audio quality = high 24";
        let result = SpatialAudioLogs.parse(line, None);
        assert_eq!(result.events[0].event_family, "target_quality");
        match &result.events[0].fields {
            EventFields::SpatialAudio(f) => assert_eq!(f.quality.as_deref(), Some("high 24")),
            other => panic!("unexpected fields: {other:?}"),
        }
    }
}
