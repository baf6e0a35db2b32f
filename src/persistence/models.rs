//! Row models read back from the store.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One stored session row projected down to what the KPI math needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRow {
    /// Raw machine label as ingested.
    pub machine_label: String,
    /// Calendar date derived from the session label at ingest time.
    pub session_date: NaiveDate,
    /// Total-in meter (missing stored values read back as `0`).
    pub total_in: f64,
    /// Total-out meter (missing stored values read back as `0`).
    pub total_out: f64,
}

/// One machine from the canonical registry, read-only to this service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MachineRegistryEntry {
    /// Canonical machine number (the registry's tag, e.g. `"0012"`).
    pub machine_number: String,
    /// Model identifier, when the machine is catalogued.
    pub model_id: Option<i32>,
    /// Model name, when the machine is catalogued.
    pub model_name: Option<String>,
    /// Vendor name, when the model has one.
    pub provider_name: Option<String>,
    /// Operational status (e.g. `"Activo"`).
    pub status: Option<String>,
}
