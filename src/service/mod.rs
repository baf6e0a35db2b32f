//! Service layer: business logic orchestration.
//!
//! [`HoldService`] builds KPI context snapshots from bounded store
//! reads; [`IngestService`] runs the extract → dedup-plan → bulk-insert
//! pipeline. Both are thin async shells over pure functions so the
//! aggregation and planning semantics are testable without a database.

pub mod hold_service;
pub mod ingest_service;

pub use hold_service::{HoldContext, HoldService};
pub use ingest_service::{IngestReport, IngestService};
