//! Backend cache lookup classifier. Every record is a `lookup`; the message
//! tail decides hit (`, URL: <endpoint>`) versus miss (` - NOT exists`).

use once_cell::sync::Lazy;
use regex::Regex;

use super::optional;
use crate::fields::{BackendCacheFields, EventFields};
use crate::grouper::group_by_header;
use crate::model::{LogEvent, LogLevel, LogType, ParsedLog};
use crate::registry::LogClassifier;
use crate::timefmt::normalize_timestamp;

static HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?P<timestamp>\d{4}-\d{2}-\d{2} [^|]+)\|(?P<version>[^|]*)\|Info\|backendCache\|BackendCache\.Load File name: (?P<rest>.*)$",
    )
    .unwrap()
});

const MISS_SUFFIX: &str = " - NOT exists";
const URL_SEPARATOR: &str = ", URL:";

pub struct BackendCacheLogs;

impl LogClassifier for BackendCacheLogs {
    fn log_type(&self) -> LogType {
        LogType::BackendCache
    }

    fn parse(&self, content: &str, file_path: Option<&str>) -> ParsedLog {
        let events = group_by_header(content, &HEADER)
            .into_iter()
            .map(|rec| {
                let rest = rec.group("rest").trim().to_string();
                let timestamp_raw = rec.group("timestamp").to_string();
                LogEvent {
                    log_type: LogType::BackendCache,
                    timestamp: normalize_timestamp(&timestamp_raw),
                    timestamp_raw,
                    version: optional(rec.group("version")),
                    level: Some(LogLevel::Info),
                    component: LogType::BackendCache.as_str(),
                    event_family: "lookup".to_string(),
                    fields: EventFields::BackendCache(classify(&rest)),
                    continuation: None,
                    message: rest,
                }
            })
            .collect();

        ParsedLog::assemble(LogType::BackendCache, events, file_path)
    }
}

fn classify(rest: &str) -> BackendCacheFields {
    let miss = rest.contains(MISS_SUFFIX);
    let mut path = rest.trim().to_string();
    let mut endpoint = String::new();

    if let Some(idx) = rest.find(URL_SEPARATOR) {
        path = rest[..idx].trim().to_string();
        endpoint = rest[idx + URL_SEPARATOR.len()..].trim().to_string();
    } else if miss {
        path = rest.trim_end_matches(MISS_SUFFIX).trim().to_string();
    }

    BackendCacheFields {
        path,
        endpoint,
        cache_hit: !miss,
    }
}
