//! Upload preview DTOs.
//!
//! Import results reuse [`crate::service::IngestReport`] directly; the
//! preview response flattens extract rows into plain JSON arrays.

use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{CANONICAL_COLUMNS, RawExtractRow};

/// One normalized extract row for preview display.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PreviewRow {
    /// Free-text machine label.
    pub machine: String,
    /// Free-text session label.
    pub session: String,
    /// Metric values in canonical column order; `null` is missing.
    pub metrics: Vec<Option<f64>>,
}

impl From<RawExtractRow> for PreviewRow {
    fn from(row: RawExtractRow) -> Self {
        Self {
            machine: row.machine,
            session: row.session,
            metrics: row.metrics.to_vec(),
        }
    }
}

/// Response body for `POST /hold/preview`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PreviewResponse {
    /// Canonical column schema, in order.
    pub columns: Vec<String>,
    /// Number of normalized rows.
    pub row_count: usize,
    /// Normalized rows, ready for ingestion.
    pub rows: Vec<PreviewRow>,
}

impl PreviewResponse {
    /// Builds a preview from normalized extract rows.
    #[must_use]
    pub fn from_rows(rows: Vec<RawExtractRow>) -> Self {
        let rows: Vec<PreviewRow> = rows.into_iter().map(PreviewRow::from).collect();
        Self {
            columns: CANONICAL_COLUMNS.iter().map(|c| (*c).to_string()).collect(),
            row_count: rows.len(),
            rows,
        }
    }
}
