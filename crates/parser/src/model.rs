use serde::{Deserialize, Serialize};

use crate::fields::EventFields;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LogType {
    #[serde(rename = "application")]
    Application,
    #[serde(rename = "backend")]
    Backend,
    #[serde(rename = "backendCache")]
    BackendCache,
    #[serde(rename = "backend_queue")]
    BackendQueue,
    #[serde(rename = "errors")]
    Errors,
    #[serde(rename = "files-checker")]
    FilesChecker,
    #[serde(rename = "insurance")]
    Insurance,
    #[serde(rename = "inventory")]
    Inventory,
    #[serde(rename = "network-connection")]
    NetworkConnection,
    #[serde(rename = "network-messages")]
    NetworkMessages,
    #[serde(rename = "objectPool")]
    ObjectPool,
    #[serde(rename = "output")]
    Output,
    #[serde(rename = "push-notifications")]
    PushNotifications,
    #[serde(rename = "player")]
    Player,
    #[serde(rename = "seasons")]
    Seasons,
    #[serde(rename = "spatial-audio")]
    SpatialAudio,
    #[serde(rename = "aiData")]
    AiData,
    #[serde(rename = "aiErrors")]
    AiErrors,
}

impl LogType {
    /// The component literal as it appears between the pipes of a header line.
    /// Doubles as the filename marker (`<lowercased>_`) for detection.
    pub fn as_str(&self) -> &'static str {
        match self {
            LogType::Application => "application",
            LogType::Backend => "backend",
            LogType::BackendCache => "backendCache",
            LogType::BackendQueue => "backend_queue",
            LogType::Errors => "errors",
            LogType::FilesChecker => "files-checker",
            LogType::Insurance => "insurance",
            LogType::Inventory => "inventory",
            LogType::NetworkConnection => "network-connection",
            LogType::NetworkMessages => "network-messages",
            LogType::ObjectPool => "objectPool",
            LogType::Output => "output",
            LogType::PushNotifications => "push-notifications",
            LogType::Player => "player",
            LogType::Seasons => "seasons",
            LogType::SpatialAudio => "spatial-audio",
            LogType::AiData => "aiData",
            LogType::AiErrors => "aiErrors",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogLevel {
    Info,
    Warn,
    Warning,
    Error,
    Debug,
}

impl LogLevel {
    /// Lenient parse of the level column. Unknown text maps to `None` rather
    /// than failing the record.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "Info" => Some(LogLevel::Info),
            "Warn" => Some(LogLevel::Warn),
            "Warning" => Some(LogLevel::Warning),
            "Error" => Some(LogLevel::Error),
            "Debug" => Some(LogLevel::Debug),
            _ => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, LogLevel::Error)
    }

    pub fn is_warning(&self) -> bool {
        matches!(self, LogLevel::Warn | LogLevel::Warning)
    }
}

/// One classified log record.
///
/// `timestamp` is the normalized UTC form, `timestamp_raw` the text exactly as
/// logged. `event_family` is never empty; `other` is the catch-all family.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEvent {
    pub log_type: LogType,
    pub timestamp: String,
    pub timestamp_raw: String,
    pub version: Option<String>,
    pub level: Option<LogLevel>,
    pub component: &'static str,
    pub message: String,
    pub event_family: String,
    pub continuation: Option<Vec<String>>,
    pub fields: EventFields,
}

/// Per-file metadata derived once from the parsed events.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseMeta {
    pub earliest_timestamp: Option<String>,
    pub latest_timestamp: Option<String>,
    pub build_version: Option<String>,
    pub session_prefix: Option<String>,
}

/// The result of parsing one file (or one literal text unit).
///
/// Built once by a classifier; afterwards only event fields may be touched,
/// in place, by the enrichment pass.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedLog {
    pub file_path: Option<String>,
    pub log_type: LogType,
    pub events: Vec<LogEvent>,
    pub meta: ParseMeta,
}

impl ParsedLog {
    pub fn assemble(log_type: LogType, events: Vec<LogEvent>, file_path: Option<&str>) -> Self {
        let meta = derive_meta(&events, file_path);
        Self {
            file_path: file_path.map(str::to_string),
            log_type,
            events,
            meta,
        }
    }
}

fn derive_meta(events: &[LogEvent], file_path: Option<&str>) -> ParseMeta {
    // Normalized timestamps are RFC 3339 in UTC, so lexicographic order is
    // chronological order.
    let mut timestamps: Vec<&str> = events.iter().map(|e| e.timestamp.as_str()).collect();
    timestamps.sort_unstable();

    ParseMeta {
        earliest_timestamp: timestamps.first().map(|s| s.to_string()),
        latest_timestamp: timestamps.last().map(|s| s.to_string()),
        build_version: events.iter().find_map(|e| e.version.clone()),
        session_prefix: file_path.and_then(session_prefix),
    }
}

static SESSION_PREFIX: once_cell::sync::Lazy<regex::Regex> = once_cell::sync::Lazy::new(|| {
    regex::Regex::new(r"log_(\d{4}\.\d{2}\.\d{2}_\d{2}-\d{2}-\d{2}_[^/\\\s]+)").unwrap()
});

/// Session identity token from the `log_<date>_<time>_<build>` filename
/// convention, matched anywhere in the path.
pub fn session_prefix(file_path: &str) -> Option<String> {
    SESSION_PREFIX
        .captures(file_path)
        .map(|c| c[1].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_type_wire_names() {
        assert_eq!(LogType::BackendCache.as_str(), "backendCache");
        assert_eq!(LogType::NetworkConnection.as_str(), "network-connection");
        assert_eq!(LogType::BackendQueue.as_str(), "backend_queue");
    }

    #[test]
    fn test_level_parse_lenient() {
        assert_eq!(LogLevel::parse(" Info "), Some(LogLevel::Info));
        assert_eq!(LogLevel::parse("Warning"), Some(LogLevel::Warning));
        assert_eq!(LogLevel::parse("garbage"), None);
    }

    #[test]
    fn test_session_prefix_extraction() {
        let path = r"C:\logs\log_2025.12.08_15-01-51_1.0.0.2.42157 application.log";
        assert_eq!(
            session_prefix(path).as_deref(),
            Some("2025.12.08_15-01-51_1.0.0.2.42157")
        );
        assert_eq!(session_prefix("random.log"), None);
    }

    #[test]
    fn test_derive_meta_orders_timestamps() {
        let mk = |ts: &str, version: Option<&str>| LogEvent {
            log_type: LogType::Application,
            timestamp: ts.to_string(),
            timestamp_raw: ts.to_string(),
            version: version.map(str::to_string),
            level: Some(LogLevel::Info),
            component: "application",
            message: String::new(),
            event_family: "other".to_string(),
            continuation: None,
            fields: EventFields::None,
        };
        let events = vec![
            mk("2025-12-08T15:01:53.000Z", None),
            mk("2025-12-08T15:01:51.000Z", Some("1.0.0.2")),
        ];
        let meta = derive_meta(&events, None);
        assert_eq!(meta.earliest_timestamp.as_deref(), Some("2025-12-08T15:01:51.000Z"));
        assert_eq!(meta.latest_timestamp.as_deref(), Some("2025-12-08T15:01:53.000Z"));
        assert_eq!(meta.build_version.as_deref(), Some("1.0.0.2"));
    }
}
