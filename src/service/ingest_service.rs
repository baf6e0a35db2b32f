//! Extract ingestion: normalize, deduplicate, bulk-persist.

use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::RawExtractRow;
use crate::error::AnalyticsError;
use crate::extract;
use crate::ingest::plan_batch;
use crate::persistence::PostgresStore;

/// Structured ingestion result.
///
/// `skipped` counts duplicates and rows with missing identifiers — a
/// normal outcome of re-uploading the same extract. A storage failure
/// is reported as an error instead, with zero rows persisted.
#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
pub struct IngestReport {
    /// Rows persisted by this request.
    pub inserted: u64,
    /// Rows skipped as duplicates or for missing identifiers.
    pub skipped: u64,
}

/// Runs the extract → plan → bulk-insert pipeline.
#[derive(Debug, Clone)]
pub struct IngestService {
    store: PostgresStore,
}

impl IngestService {
    /// Creates a new `IngestService`.
    #[must_use]
    pub fn new(store: PostgresStore) -> Self {
        Self { store }
    }

    /// Normalizes an uploaded workbook without touching the store.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyticsError::UnsupportedFormat`] for unparseable
    /// uploads and [`AnalyticsError::SchemaMismatch`] on template drift.
    pub fn preview(
        &self,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<Vec<RawExtractRow>, AnalyticsError> {
        let range = extract::read_first_sheet(filename, bytes)?;
        extract::normalize_sheet(&range)
    }

    /// Ingests an uploaded workbook end to end.
    ///
    /// Loads the stored key set once, plans the batch in memory, then
    /// persists all staged rows in a single transaction. Re-running on
    /// an identical extract inserts nothing and skips every row.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyticsError::UnsupportedFormat`] or
    /// [`AnalyticsError::SchemaMismatch`] for bad uploads, and
    /// [`AnalyticsError::Ingestion`] when the bulk write fails (rolled
    /// back, nothing persisted).
    pub async fn ingest(
        &self,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<IngestReport, AnalyticsError> {
        let rows = self.preview(filename, bytes)?;

        let existing = self.store.existing_keys().await?;
        let plan = plan_batch(&existing, &rows);

        let inserted = if plan.staged.is_empty() {
            0
        } else {
            self.store.insert_records(&plan.staged).await?
        };

        tracing::info!(
            filename,
            inserted,
            skipped = plan.skipped,
            "extract ingested"
        );
        Ok(IngestReport {
            inserted,
            skipped: plan.skipped,
        })
    }
}
