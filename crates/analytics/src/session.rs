//! Session correlation.
//!
//! A session spans every log file sharing the filename-embedded
//! date-time-build token. Folding per-file contributions is commutative, so
//! files can be parsed and merged in any order.

use std::collections::HashMap;

use parser::model::{session_prefix, LogEvent, ParsedLog};

use crate::model::{LevelTotals, SessionSummary};

/// Shared fallback bucket for files without a session token.
pub const UNKNOWN_SESSION: &str = "unknown";

/// Session identity for statistics folding: every unmatched file lands in
/// one shared bucket.
pub fn stats_session_id(result: &ParsedLog) -> String {
    result
        .meta
        .session_prefix
        .clone()
        .or_else(|| result.file_path.as_deref().and_then(session_prefix))
        .unwrap_or_else(|| UNKNOWN_SESSION.to_string())
}

/// Session identity for timeline building: unmatched files each get their
/// own bucket so unrelated logs are never silently merged. `ordinal`
/// disambiguates pathless inputs.
pub fn timeline_session_id(result: &ParsedLog, ordinal: usize) -> String {
    result
        .meta
        .session_prefix
        .clone()
        .or_else(|| result.file_path.as_deref().and_then(session_prefix))
        .unwrap_or_else(|| match &result.file_path {
            Some(path) => format!("file:{path}"),
            None => format!("unknown#{ordinal}"),
        })
}

pub fn count_levels(events: &[LogEvent]) -> LevelTotals {
    let mut totals = LevelTotals {
        events: events.len() as u64,
        ..Default::default()
    };
    for event in events {
        if let Some(level) = event.level {
            if level.is_error() {
                totals.errors += 1;
            }
            if level.is_warning() {
                totals.warnings += 1;
            }
        }
    }
    totals
}

/// Fold per-file results into one summary per session.
pub fn fold_summaries(results: &[ParsedLog]) -> Vec<SessionSummary> {
    let mut order: Vec<String> = Vec::new();
    let mut by_session: HashMap<String, SessionSummary> = HashMap::new();

    for result in results {
        let session_id = stats_session_id(result);
        let counts = count_levels(&result.events);

        match by_session.get_mut(&session_id) {
            None => {
                order.push(session_id.clone());
                by_session.insert(
                    session_id.clone(),
                    SessionSummary {
                        id: session_id,
                        build_version: result.meta.build_version.clone(),
                        earliest_timestamp: result.meta.earliest_timestamp.clone(),
                        latest_timestamp: result.meta.latest_timestamp.clone(),
                        log_types: vec![result.log_type],
                        totals: counts,
                    },
                );
            }
            Some(existing) => {
                existing.totals.events += counts.events;
                existing.totals.errors += counts.errors;
                existing.totals.warnings += counts.warnings;
                if !existing.log_types.contains(&result.log_type) {
                    existing.log_types.push(result.log_type);
                }
                if let Some(earliest) = &result.meta.earliest_timestamp {
                    if existing
                        .earliest_timestamp
                        .as_ref()
                        .is_none_or(|current| earliest < current)
                    {
                        existing.earliest_timestamp = Some(earliest.clone());
                    }
                }
                if let Some(latest) = &result.meta.latest_timestamp {
                    if existing
                        .latest_timestamp
                        .as_ref()
                        .is_none_or(|current| latest > current)
                    {
                        existing.latest_timestamp = Some(latest.clone());
                    }
                }
                if existing.build_version.is_none() {
                    existing.build_version = result.meta.build_version.clone();
                }
            }
        }
    }

    order
        .into_iter()
        .filter_map(|id| by_session.remove(&id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use parser::formats::{ApplicationLogs, BackendLogs};
    use parser::registry::LogClassifier;

    fn app_result(path: &str) -> ParsedLog {
        ApplicationLogs.parse(
            "2025-12-08 15:01:51.519|1.0.0.2|Info|application|Application awaken\n\
             2025-12-08 15:01:52.000|1.0.0.2|Error|application|BattlEye environment validation failed\n",
            Some(path),
        )
    }

    fn backend_result(path: &str) -> ParsedLog {
        BackendLogs.parse(
            "2025-12-08 15:01:56.519|1.0.0.2|Info|backend|---> Request  id [1] send: URL: https://prod/x, crc: 1.\n",
            Some(path),
        )
    }

    const SESSION_PATH_A: &str = "logs/log_2025.12.08_15-01-51_1.0.0.2 application_.log";
    const SESSION_PATH_B: &str = "logs/log_2025.12.08_15-01-51_1.0.0.2 backend_.log";

    #[test]
    fn test_files_sharing_prefix_merge() {
        let folded = fold_summaries(&[app_result(SESSION_PATH_A), backend_result(SESSION_PATH_B)]);
        assert_eq!(folded.len(), 1);
        let session = &folded[0];
        assert_eq!(session.id, "2025.12.08_15-01-51_1.0.0.2");
        assert_eq!(session.totals.events, 3);
        assert_eq!(session.totals.errors, 1);
        assert_eq!(session.log_types.len(), 2);
        assert_eq!(
            session.earliest_timestamp.as_deref(),
            Some("2025-12-08T15:01:51.519Z")
        );
        assert_eq!(
            session.latest_timestamp.as_deref(),
            Some("2025-12-08T15:01:56.519Z")
        );
    }

    #[test]
    fn test_folding_is_commutative() {
        let forward = fold_summaries(&[app_result(SESSION_PATH_A), backend_result(SESSION_PATH_B)]);
        let reverse = fold_summaries(&[backend_result(SESSION_PATH_B), app_result(SESSION_PATH_A)]);
        assert_eq!(forward.len(), 1);
        assert_eq!(reverse.len(), 1);
        let (a, b) = (&forward[0], &reverse[0]);
        assert_eq!(a.totals.events, b.totals.events);
        assert_eq!(a.totals.errors, b.totals.errors);
        assert_eq!(a.earliest_timestamp, b.earliest_timestamp);
        assert_eq!(a.latest_timestamp, b.latest_timestamp);
        let mut types_a = a.log_types.clone();
        let mut types_b = b.log_types.clone();
        types_a.sort();
        types_b.sort();
        assert_eq!(types_a, types_b);
    }

    #[test]
    fn test_pathless_results_share_unknown_bucket() {
        let folded = fold_summaries(&[
            ApplicationLogs.parse("2025-12-08 15:01:51.519|1|Info|application|Application awaken", None),
            BackendLogs.parse("2025-12-08 15:01:52.519|1|Info|backend|chatter", None),
        ]);
        assert_eq!(folded.len(), 1);
        assert_eq!(folded[0].id, UNKNOWN_SESSION);
    }

    #[test]
    fn test_timeline_id_is_per_file_unique() {
        let with_path = backend_result("some/backend_.log");
        assert_eq!(timeline_session_id(&with_path, 0), "file:some/backend_.log");

        let pathless = BackendLogs.parse("2025-12-08 15:01:52.519|1|Info|backend|x", None);
        assert_eq!(timeline_session_id(&pathless, 3), "unknown#3");
    }
}
