//! Header/continuation line grouping.
//!
//! A line matching a log type's header pattern starts a record; every
//! following non-header, non-blank line is a continuation of that record.
//! Lines before the first header and blank lines are dropped.

use std::collections::HashMap;

use regex::Regex;

/// One header line together with its captured groups and trailing
/// continuation lines, in file order.
#[derive(Debug, Clone)]
pub struct HeaderRecord {
    pub line: String,
    pub groups: HashMap<String, String>,
    pub continuation: Vec<String>,
}

impl HeaderRecord {
    /// Captured group by name; empty string when the group did not take part
    /// in the match.
    pub fn group(&self, name: &str) -> &str {
        self.groups.get(name).map(String::as_str).unwrap_or("")
    }
}

/// Split `content` into header-delimited records.
///
/// The header pattern must use named capture groups with a leading
/// `timestamp` group. Text with no matching header produces an empty vec,
/// not an error.
pub fn group_by_header(content: &str, header: &Regex) -> Vec<HeaderRecord> {
    let normalized = content.replace("\r\n", "\n");
    let mut records: Vec<HeaderRecord> = Vec::new();
    let mut current: Option<HeaderRecord> = None;

    for line in normalized.split('\n') {
        if let Some(caps) = header.captures(line) {
            if let Some(done) = current.take() {
                records.push(done);
            }
            let mut groups = HashMap::new();
            for name in header.capture_names().flatten() {
                if let Some(m) = caps.name(name) {
                    groups.insert(name.to_string(), m.as_str().to_string());
                }
            }
            current = Some(HeaderRecord {
                line: line.to_string(),
                groups,
                continuation: Vec::new(),
            });
        } else if let Some(ref mut record) = current {
            if line.trim().is_empty() {
                continue;
            }
            record.continuation.push(line.to_string());
        }
    }
    if let Some(done) = current.take() {
        records.push(done);
    }

    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use once_cell::sync::Lazy;

    static HEADER: Lazy<Regex> = Lazy::new(|| {
        Regex::new(
            r"^(?P<timestamp>\d{4}-\d{2}-\d{2} [^|]+)\|(?P<version>[^|]*)\|(?P<level>[^|]*)\|application\|(?P<message>.*)$",
        )
        .unwrap()
    });

    #[test]
    fn test_one_record_per_header_line() {
        let content = "2025-12-08 15:01:51.519|1.0.0.2|Info|application|first\n\
                       2025-12-08 15:01:52.100|1.0.0.2|Info|application|second\n\
                       2025-12-08 15:01:52.900|1.0.0.2|Info|application|third\n";
        let records = group_by_header(content, &HEADER);
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].group("message"), "first");
        assert_eq!(records[2].group("message"), "third");
    }

    #[test]
    fn test_continuation_lines_attach_in_order() {
        let content = "2025-12-08 15:01:51.519|1|Error|application|boom\n\
                       stack frame one\n\
                       stack frame two\n\
                       2025-12-08 15:01:53.000|1|Info|application|recovered\n";
        let records = group_by_header(content, &HEADER);
        assert_eq!(records.len(), 2);
        assert_eq!(
            records[0].continuation,
            vec!["stack frame one".to_string(), "stack frame two".to_string()]
        );
        assert!(records[1].continuation.is_empty());
    }

    #[test]
    fn test_blank_lines_dropped() {
        let content = "2025-12-08 15:01:51.519|1|Error|application|boom\n\
                       \n\
                       detail\n\
                       \n";
        let records = group_by_header(content, &HEADER);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].continuation, vec!["detail".to_string()]);
    }

    #[test]
    fn test_no_headers_is_empty_not_error() {
        let records = group_by_header("nothing here\nat all\n", &HEADER);
        assert!(records.is_empty());
    }

    #[test]
    fn test_leading_noise_before_first_header_dropped() {
        let content = "banner line\n2025-12-08 15:01:51.519|1|Info|application|hello\n";
        let records = group_by_header(content, &HEADER);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].group("message"), "hello");
    }

    #[test]
    fn test_crlf_normalized() {
        let content = "2025-12-08 15:01:51.519|1|Info|application|one\r\ntail\r\n";
        let records = group_by_header(content, &HEADER);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].continuation, vec!["tail".to_string()]);
    }
}
