//! # hold-analytics
//!
//! Hold analytics service for a slot-machine gaming floor.
//!
//! Ingests per-machine daily performance extracts (legacy xls/xlsx floor
//! reports) into a canonical time-series store with idempotent
//! deduplication, and computes floor-level and per-model hold KPIs
//! (net win, credits-in, retention) over year/month/day/model filters.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP)
//!     │
//!     ├── REST Handlers (api/)
//!     │
//!     ├── IngestService / HoldService (service/)
//!     │       │
//!     │       ├── Spreadsheet Normalizer (extract/)
//!     │       ├── Batch dedup planner (ingest/)
//!     │       └── KPI math + label normalization (domain/)
//!     │
//!     └── PostgresStore (persistence/)
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod extract;
pub mod ingest;
pub mod persistence;
pub mod service;
