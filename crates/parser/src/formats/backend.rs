//! Backend HTTP traffic classifier: request/response pairs, transport
//! errors, retries and server-side exceptions.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{continuation_of, group_num, group_string, optional};
use crate::fields::{BackendFields, EventFields};
use crate::grouper::group_by_header;
use crate::model::{LogEvent, LogLevel, LogType, ParsedLog};
use crate::registry::LogClassifier;
use crate::timefmt::normalize_timestamp;

static HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?P<timestamp>\d{4}-\d{2}-\d{2} [^|]+)\|(?P<version>[^|]*)\|(?P<level>[^|]*)\|backend\|(?P<message>.*)$",
    )
    .unwrap()
});

static REQUEST: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"id \[(\d+)\].*URL:\s*([^,]+), crc:\s*(.*)\.?").unwrap());
static RESPONSE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"id \[(\d+)\]: URL:\s*([^,]+), crc:\s*(.*?)(?:, responseText:|$)").unwrap());
static TRANSPORT_ERROR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"HTTPS:\s*([^,]+),.*responseCode:(\d+)").unwrap());
static ERROR_RESULT: Lazy<Regex> = Lazy::new(|| Regex::new(r"result:([^,]+)").unwrap());
static RETRY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)retry:(\d+)\s+from\s+retries:(\d+)").unwrap());
static RETRY_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Request\s+([^\s]+)\s+will be retried").unwrap());
static STATUS_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d{3})").unwrap());

pub struct BackendLogs;

impl LogClassifier for BackendLogs {
    fn log_type(&self) -> LogType {
        LogType::Backend
    }

    fn parse(&self, content: &str, file_path: Option<&str>) -> ParsedLog {
        let events = group_by_header(content, &HEADER)
            .into_iter()
            .map(|rec| {
                let message = rec.group("message").trim().to_string();
                let timestamp_raw = rec.group("timestamp").to_string();
                let (family, fields) = classify(&message);
                LogEvent {
                    log_type: LogType::Backend,
                    timestamp: normalize_timestamp(&timestamp_raw),
                    timestamp_raw,
                    version: optional(rec.group("version")),
                    level: LogLevel::parse(rec.group("level")),
                    component: LogType::Backend.as_str(),
                    event_family: family.to_string(),
                    fields: EventFields::Backend(fields),
                    continuation: continuation_of(rec.continuation),
                    message,
                }
            })
            .collect();

        ParsedLog::assemble(LogType::Backend, events, file_path)
    }
}

fn classify(message: &str) -> (&'static str, BackendFields) {
    if message.starts_with("---> Request") {
        let caps = REQUEST.captures(message);
        let fields = BackendFields {
            id: caps.as_ref().and_then(|c| group_num(c, 1)),
            url: caps.as_ref().and_then(|c| group_string(c, 2)),
            crc: caps.as_ref().and_then(|c| group_string(c, 3)),
            ..Default::default()
        };
        return ("request", fields);
    }
    if message.starts_with("<--- Response") {
        let caps = RESPONSE.captures(message);
        let fields = BackendFields {
            id: caps.as_ref().and_then(|c| group_num(c, 1)),
            url: caps.as_ref().and_then(|c| group_string(c, 2)),
            crc: caps.as_ref().and_then(|c| group_string(c, 3)),
            ..Default::default()
        };
        return ("response", fields);
    }
    if message.starts_with("<--- Error!") {
        let caps = TRANSPORT_ERROR.captures(message);
        let fields = BackendFields {
            url: caps.as_ref().and_then(|c| group_string(c, 1)),
            response_code: caps.as_ref().and_then(|c| group_num(c, 2)),
            error_reason: ERROR_RESULT.captures(message).and_then(|c| group_string(&c, 1)),
            ..Default::default()
        };
        return ("transport_error", fields);
    }
    if message.starts_with("Request") && message.contains("will be retried") {
        let caps = RETRY.captures(message);
        let fields = BackendFields {
            url: RETRY_URL.captures(message).and_then(|c| group_string(&c, 1)),
            retry: caps.as_ref().and_then(|c| group_num(c, 1)),
            retries: caps.as_ref().and_then(|c| group_num(c, 2)),
            error_reason: message
                .split_once("error:")
                .map(|(_, tail)| tail.trim().to_string()),
            ..Default::default()
        };
        return ("retry", fields);
    }
    if message.starts_with("JSON parsing into") {
        let fields = BackendFields {
            error_reason: Some(message.to_string()),
            ..Default::default()
        };
        return ("deserialization_error", fields);
    }
    if message.contains("BackendServerSideException") {
        let fields = BackendFields {
            response_code: STATUS_CODE.captures(message).and_then(|c| group_num(&c, 1)),
            error_reason: Some(message.to_string()),
            ..Default::default()
        };
        return ("server_exception", fields);
    }
    ("other", BackendFields::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single(line: &str) -> LogEvent {
        let mut result = BackendLogs.parse(line, None);
        assert_eq!(result.events.len(), 1);
        result.events.remove(0)
    }

    fn backend_fields(event: &LogEvent) -> &BackendFields {
        match &event.fields {
            EventFields::Backend(f) => f,
            other => panic!("unexpected fields: {other:?}"),
        }
    }

    #[test]
    fn test_request_line() {
        let event = single(
            "2025-12-08 15:01:52.000|1.0.0.2|Info|backend|---> Request  id [17] send: URL: https://prod.escape/client/items, crc: 1179079082.",
        );
        assert_eq!(event.event_family, "request");
        let f = backend_fields(&event);
        assert_eq!(f.id, Some(17));
        assert_eq!(f.url.as_deref(), Some("https://prod.escape/client/items"));
    }

    #[test]
    fn test_response_line() {
        let event = single(
            "2025-12-08 15:01:52.400|1.0.0.2|Info|backend|<--- Response  id [17]: URL: https://prod.escape/client/items, crc: 1179079082, responseText: ...",
        );
        assert_eq!(event.event_family, "response");
        let f = backend_fields(&event);
        assert_eq!(f.id, Some(17));
        assert_eq!(f.crc.as_deref(), Some("1179079082"));
    }

    #[test]
    fn test_transport_error_line() {
        let event = single(
            "2025-12-08 15:01:53.000|1.0.0.2|Error|backend|<--- Error! HTTPS: https://prod.escape/client/match, result:ConnectionError, responseCode:502",
        );
        assert_eq!(event.event_family, "transport_error");
        let f = backend_fields(&event);
        assert_eq!(f.response_code, Some(502));
        assert_eq!(f.error_reason.as_deref(), Some("ConnectionError"));
    }

    #[test]
    fn test_retry_line() {
        let event = single(
            "2025-12-08 15:01:54.000|1.0.0.2|Warn|backend|Request https://prod.escape/client/match will be retried retry:1 from retries:3 error:timeout",
        );
        assert_eq!(event.event_family, "retry");
        let f = backend_fields(&event);
        assert_eq!(f.retry, Some(1));
        assert_eq!(f.retries, Some(3));
        assert_eq!(f.error_reason.as_deref(), Some("timeout"));
    }

    #[test]
    fn test_server_exception_extracts_code() {
        let event = single(
            "2025-12-08 15:01:55.000|1.0.0.2|Error|backend|BackendServerSideException code 228 at /client/trading",
        );
        assert_eq!(event.event_family, "server_exception");
        assert_eq!(backend_fields(&event).response_code, Some(228));
    }

    #[test]
    fn test_unknown_is_other() {
        let event = single("2025-12-08 15:01:56.000|1.0.0.2|Info|backend|Session keepalive tick");
        assert_eq!(event.event_family, "other");
    }
}
