//! Network connection lifecycle classifier: connect/disconnect handshakes,
//! state transitions, timeouts and link-quality statistics.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{group_num, group_string, optional};
use crate::fields::{EventFields, NetworkConnectionFields};
use crate::grouper::group_by_header;
use crate::model::{LogEvent, LogLevel, LogType, ParsedLog};
use crate::registry::LogClassifier;
use crate::timefmt::normalize_timestamp;

static HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?P<timestamp>\d{4}-\d{2}-\d{2} [^|]+)\|(?P<version>[^|]*)\|(?P<level>[^|]*)\|network-connection\|(?P<message>.*)$",
    )
    .unwrap()
});

static ADDRESS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)address:\s*([^\),]+)").unwrap());
static REASON: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)reason:\s*(\d+)").unwrap());
static RTT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)rtt:\s*(\d+)").unwrap());
static LOSE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)lose:\s*(\d+)").unwrap());
static SENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)sent:\s*(\d+)").unwrap());
static RECEIVED: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)received:\s*(\d+)").unwrap());
static STATE: Lazy<Regex> = Lazy::new(|| Regex::new(r"'([^']+)'").unwrap());
static FLAGS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)syn:\s*(\w+), asc:\s*(\w+)").unwrap());
static TIMEOUT_MS: Lazy<Regex> = Lazy::new(|| Regex::new(r"for\s+(\d+)ms").unwrap());

pub struct NetworkConnectionLogs;

impl LogClassifier for NetworkConnectionLogs {
    fn log_type(&self) -> LogType {
        LogType::NetworkConnection
    }

    fn parse(&self, content: &str, file_path: Option<&str>) -> ParsedLog {
        let events = group_by_header(content, &HEADER)
            .into_iter()
            .map(|rec| {
                let message = rec.group("message").trim().to_string();
                let timestamp_raw = rec.group("timestamp").to_string();
                let (family, fields) = classify(&message);
                LogEvent {
                    log_type: LogType::NetworkConnection,
                    timestamp: normalize_timestamp(&timestamp_raw),
                    timestamp_raw,
                    version: optional(rec.group("version")),
                    level: LogLevel::parse(rec.group("level")),
                    component: LogType::NetworkConnection.as_str(),
                    event_family: family.to_string(),
                    fields: EventFields::NetworkConnection(fields),
                    continuation: None,
                    message,
                }
            })
            .collect();

        ParsedLog::assemble(LogType::NetworkConnection, events, file_path)
    }
}

fn bool_flag(caps: &regex::Captures<'_>, idx: usize) -> Option<bool> {
    caps.get(idx).map(|m| m.as_str().eq_ignore_ascii_case("true"))
}

fn classify(message: &str) -> (&'static str, NetworkConnectionFields) {
    let address = ADDRESS.captures(message).and_then(|c| group_string(&c, 1));

    if message.starts_with("Connect (") || message.starts_with("Connect(") {
        return ("connect", NetworkConnectionFields { address, ..Default::default() });
    }
    if message.starts_with("Disconnect (") || message.starts_with("Disconnect(") {
        return ("disconnect", NetworkConnectionFields { address, ..Default::default() });
    }
    if message.starts_with("Send disconnect") {
        let fields = NetworkConnectionFields {
            address,
            disconnect_reason: REASON.captures(message).and_then(|c| group_num(&c, 1)),
            ..Default::default()
        };
        return ("send_disconnect", fields);
    }
    if message.starts_with("Statistics") {
        let fields = NetworkConnectionFields {
            address,
            rtt: RTT.captures(message).and_then(|c| group_num(&c, 1)),
            packets_lost: LOSE.captures(message).and_then(|c| group_num(&c, 1)),
            packets_sent: SENT.captures(message).and_then(|c| group_num(&c, 1)),
            packets_received: RECEIVED.captures(message).and_then(|c| group_num(&c, 1)),
            ..Default::default()
        };
        return ("statistics", fields);
    }
    if message.starts_with("Enter to the") {
        let flags = FLAGS.captures(message);
        let fields = NetworkConnectionFields {
            address,
            state: STATE.captures(message).and_then(|c| group_string(&c, 1)),
            syn: flags.as_ref().and_then(|c| bool_flag(c, 1)),
            asc: flags.as_ref().and_then(|c| bool_flag(c, 2)),
            ..Default::default()
        };
        return ("state_enter", fields);
    }
    if message.starts_with("Exit to the") {
        let fields = NetworkConnectionFields {
            address,
            state: STATE.captures(message).and_then(|c| group_string(&c, 1)),
            ..Default::default()
        };
        return ("state_exit", fields);
    }
    if message.starts_with("Send connect") {
        let flags = FLAGS.captures(message);
        let fields = NetworkConnectionFields {
            address,
            syn: flags.as_ref().and_then(|c| bool_flag(c, 1)),
            asc: flags.as_ref().and_then(|c| bool_flag(c, 2)),
            ..Default::default()
        };
        return ("send_connect", fields);
    }
    if message.starts_with("Timeout") {
        let fields = NetworkConnectionFields {
            address,
            timeout_ms: TIMEOUT_MS.captures(message).and_then(|c| group_num(&c, 1)),
            ..Default::default()
        };
        return ("timeout", fields);
    }
    if message.contains("Thread was being aborted") {
        return ("thread_aborted", NetworkConnectionFields::default());
    }
    ("other", NetworkConnectionFields { address, ..Default::default() })
}
