//! Timestamp normalization for header captures.

use chrono::{DateTime, SecondsFormat, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

static TRAILING_ZONE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+([+-]\d{2}:\d{2})$").unwrap());

/// Normalize a logged timestamp into canonical RFC 3339 UTC text.
///
/// A trailing ` ±HH:MM` zone is joined with a literal `T`; otherwise the
/// value is treated as a naive local timestamp (`T` separator inserted, `Z`
/// appended). Anything that still fails to parse is returned trimmed but
/// otherwise untouched; normalization never fails and never drops data.
pub fn normalize_timestamp(raw: &str) -> String {
    let trimmed = raw.trim();
    let candidate = if TRAILING_ZONE.is_match(trimmed) {
        TRAILING_ZONE.replace(trimmed, "T$1").into_owned()
    } else if trimmed.contains('T') {
        trimmed.to_string()
    } else {
        format!("{}Z", trimmed.replacen(' ', "T", 1))
    };

    match DateTime::parse_from_rfc3339(&candidate) {
        Ok(dt) => dt
            .with_timezone(&Utc)
            .to_rfc3339_opts(SecondsFormat::Millis, true),
        Err(_) => trimmed.to_string(),
    }
}
