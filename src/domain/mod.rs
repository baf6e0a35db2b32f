//! Domain layer: core types and pure computation.
//!
//! This module contains the canonical metric schema, the label
//! normalizer used to join free-text machine identifiers against the
//! machine registry, and the guarded KPI arithmetic shared by the
//! global and filtered aggregation tiers.

pub mod kpi;
pub mod labels;
pub mod metrics;

pub use kpi::{retention_pct, safe_div};
pub use labels::{month_name, normalize_label};
pub use metrics::{CANONICAL_COLUMNS, METRIC_COUNT, PerformanceRecord, RawExtractRow, RecordKey};
