//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::service::{HoldService, IngestService};

/// Application state shared across all handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// KPI aggregation service.
    pub hold_service: Arc<HoldService>,

    /// Extract ingestion service.
    pub ingest_service: Arc<IngestService>,
}
