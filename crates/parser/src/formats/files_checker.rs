//! Files-checker (consistency ensurance) classifier.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{group_num, group_string, optional};
use crate::fields::{EventFields, FilesCheckerFields};
use crate::grouper::group_by_header;
use crate::model::{LogEvent, LogLevel, LogType, ParsedLog};
use crate::registry::LogClassifier;
use crate::timefmt::normalize_timestamp;

static HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?P<timestamp>\d{4}-\d{2}-\d{2} [^|]+)\|(?P<version>[^|]*)\|Info\|files-checker\|(?P<message>.*)$",
    )
    .unwrap()
});

static EXECUTABLE_PATH: Lazy<Regex> = Lazy::new(|| Regex::new(r"ExecutablePath:\s*(.*)").unwrap());
static ELAPSED: Lazy<Regex> = Lazy::new(|| Regex::new(r"ElapsedMilliseconds:(\d+)").unwrap());

pub struct FilesCheckerLogs;

impl LogClassifier for FilesCheckerLogs {
    fn log_type(&self) -> LogType {
        LogType::FilesChecker
    }

    fn parse(&self, content: &str, file_path: Option<&str>) -> ParsedLog {
        let events = group_by_header(content, &HEADER)
            .into_iter()
            .map(|rec| {
                let message = rec.group("message").trim().to_string();
                let timestamp_raw = rec.group("timestamp").to_string();
                let (family, fields) = classify(&message);
                LogEvent {
                    log_type: LogType::FilesChecker,
                    timestamp: normalize_timestamp(&timestamp_raw),
                    timestamp_raw,
                    version: optional(rec.group("version")),
                    level: Some(LogLevel::Info),
                    component: LogType::FilesChecker.as_str(),
                    event_family: family.to_string(),
                    fields: EventFields::FilesChecker(fields),
                    continuation: None,
                    message,
                }
            })
            .collect();

        ParsedLog::assemble(LogType::FilesChecker, events, file_path)
    }
}

fn classify(message: &str) -> (&'static str, FilesCheckerFields) {
    if message.starts_with("Consistency ensurance is launched") {
        return ("start", FilesCheckerFields::default());
    }
    if message.starts_with("ExecutablePath") {
        let fields = FilesCheckerFields {
            executable_path: EXECUTABLE_PATH
                .captures(message)
                .and_then(|c| group_string(&c, 1)),
            ..Default::default()
        };
        return ("executable_path", fields);
    }
    if message.starts_with("Consistency ensurance is succeed") {
        let fields = FilesCheckerFields {
            elapsed_ms: ELAPSED.captures(message).and_then(|c| group_num(&c, 1)),
            ..Default::default()
        };
        return ("complete", fields);
    }
    ("other", FilesCheckerFields::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle_families() {
        let content = "2025-12-08 15:00:01.000|1.0.0.2|Info|files-checker|Consistency ensurance is launched\n\
                       2025-12-08 15:00:01.100|1.0.0.2|Info|files-checker|ExecutablePath: C:/game/client.exe\n\
                       2025-12-08 15:00:09.000|1.0.0.2|Info|files-checker|Consistency ensurance is succeed. ElapsedMilliseconds:7900\n";
        let result = FilesCheckerLogs.parse(content, None);
        assert_eq!(result.events.len(), 3);
        assert_eq!(result.events[0].event_family, "start");
        assert_eq!(result.events[1].event_family, "executable_path");
        match &result.events[1].fields {
            EventFields::FilesChecker(f) => {
                assert_eq!(f.executable_path.as_deref(), Some("C:/game/client.exe"))
            }
            other => panic!("unexpected fields: {other:?}"),
        }
        assert_eq!(result.events[2].event_family, "complete");
        match &result.events[2].fields {
            EventFields::FilesChecker(f) => assert_eq!(f.elapsed_ms, Some(7900)),
            other => panic!("unexpected fields: {other:?}"),
        }
    }
}
