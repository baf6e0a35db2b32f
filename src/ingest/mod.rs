//! Deduplicating batch planner for extract ingestion.
//!
//! Planning is pure: given the set of already-stored raw
//! `(machine_label, session_label)` pairs and a candidate batch, it
//! decides which rows to stage and which to skip. Skips are a normal,
//! idempotent outcome of re-uploading the same extract — only storage
//! failures are errors, and those surface from the persistence layer
//! after planning.

use std::collections::HashSet;

use crate::domain::metrics::parse_session_date;
use crate::domain::{PerformanceRecord, RawExtractRow, RecordKey};

/// Result of planning one candidate batch.
#[derive(Debug, Clone)]
pub struct BatchPlan {
    /// Records to persist, in batch order.
    pub staged: Vec<PerformanceRecord>,
    /// Rows skipped as duplicates or for missing identifiers.
    pub skipped: u64,
}

/// Plans a candidate batch against the stored key set.
///
/// A row is skipped when its machine or session label is empty after
/// trimming, when its raw key pair is already stored, or when the same
/// pair appeared earlier in this batch. Everything else is staged with
/// the session date derived from the session label.
///
/// Key comparison is exact on raw labels — never normalized — so two
/// formatting variants of the same machine remain distinct sessions.
#[must_use]
pub fn plan_batch(existing: &HashSet<RecordKey>, rows: &[RawExtractRow]) -> BatchPlan {
    let mut staged = Vec::new();
    let mut skipped = 0u64;
    let mut seen: HashSet<RecordKey> = HashSet::new();

    for row in rows {
        let machine = row.machine.trim();
        let session = row.session.trim();
        if machine.is_empty() || session.is_empty() {
            skipped += 1;
            continue;
        }

        let key = RecordKey {
            machine_label: machine.to_string(),
            session_label: session.to_string(),
        };
        if existing.contains(&key) || seen.contains(&key) {
            skipped += 1;
            continue;
        }

        staged.push(PerformanceRecord {
            machine_label: key.machine_label.clone(),
            session_label: key.session_label.clone(),
            session_date: parse_session_date(session),
            metrics: row.metrics,
        });
        seen.insert(key);
    }

    BatchPlan { staged, skipped }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::metrics::{METRIC_COUNT, Metric};
    use chrono::NaiveDate;

    fn row(machine: &str, session: &str, total_in: f64, total_out: f64) -> RawExtractRow {
        let mut metrics = [None; METRIC_COUNT];
        if let Some(slot) = metrics.get_mut(Metric::TotalIn as usize) {
            *slot = Some(total_in);
        }
        if let Some(slot) = metrics.get_mut(Metric::TotalOut as usize) {
            *slot = Some(total_out);
        }
        RawExtractRow {
            machine: machine.to_string(),
            session: session.to_string(),
            metrics,
        }
    }

    #[test]
    fn stages_fresh_rows_and_derives_dates() {
        let rows = vec![
            row("0012", "01/03/2024 10:00", 100.0, 40.0),
            row("0012", "02/03/2024 10:00", 50.0, 50.0),
        ];
        let plan = plan_batch(&HashSet::new(), &rows);

        assert_eq!(plan.staged.len(), 2);
        assert_eq!(plan.skipped, 0);
        assert_eq!(
            plan.staged.first().and_then(|r| r.session_date),
            NaiveDate::from_ymd_opt(2024, 3, 1)
        );
    }

    #[test]
    fn reingesting_the_same_extract_skips_everything() {
        let rows = vec![
            row("0012", "01/03/2024 10:00", 100.0, 40.0),
            row("0012", "02/03/2024 10:00", 50.0, 50.0),
        ];
        let first = plan_batch(&HashSet::new(), &rows);
        assert_eq!(first.staged.len(), 2);

        let stored: HashSet<RecordKey> = first.staged.iter().map(PerformanceRecord::key).collect();
        let second = plan_batch(&stored, &rows);
        assert_eq!(second.staged.len(), 0);
        assert_eq!(second.skipped, 2);
    }

    #[test]
    fn in_batch_repeats_are_skipped_once_staged() {
        let rows = vec![
            row("0012", "01/03/2024 10:00", 100.0, 40.0),
            row("0012", "01/03/2024 10:00", 100.0, 40.0),
        ];
        let plan = plan_batch(&HashSet::new(), &rows);
        assert_eq!(plan.staged.len(), 1);
        assert_eq!(plan.skipped, 1);
    }

    #[test]
    fn empty_identifiers_are_skipped_not_fatal() {
        let rows = vec![
            row("   ", "01/03/2024 10:00", 1.0, 1.0),
            row("0012", "  ", 1.0, 1.0),
            row("0012", "01/03/2024 10:00", 1.0, 1.0),
        ];
        let plan = plan_batch(&HashSet::new(), &rows);
        assert_eq!(plan.staged.len(), 1);
        assert_eq!(plan.skipped, 2);
    }

    #[test]
    fn dedup_is_exact_on_raw_labels_not_normalized() {
        // "M-0012" and "0012" normalize differently only for registry
        // joins; as store keys they are distinct.
        let rows = vec![
            row("M-0012", "01/03/2024 10:00", 1.0, 1.0),
            row("m0012", "01/03/2024 10:00", 1.0, 1.0),
        ];
        let plan = plan_batch(&HashSet::new(), &rows);
        assert_eq!(plan.staged.len(), 2);
    }

    #[test]
    fn unparseable_session_labels_stage_without_a_date() {
        let rows = vec![row("0012", "turno tarde", 1.0, 1.0)];
        let plan = plan_batch(&HashSet::new(), &rows);
        assert_eq!(plan.staged.len(), 1);
        assert_eq!(plan.staged.first().and_then(|r| r.session_date), None);
    }
}
