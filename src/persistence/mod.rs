//! Persistence layer: PostgreSQL time-series store and registry reads.
//!
//! [`postgres::PostgresStore`] owns every SQL statement in the crate.
//! All values are bound parameters; table and column identifiers come
//! only from literals and the canonical metric mapping in
//! [`crate::domain::metrics`], never from request data.

pub mod models;
pub mod postgres;

pub use models::{MachineRegistryEntry, SessionRow};
pub use postgres::PostgresStore;
