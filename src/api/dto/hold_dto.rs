//! KPI query parameters.

use serde::Deserialize;
use utoipa::IntoParams;

/// Optional filters for `GET /hold`.
///
/// Every parameter is optional; the service defaults to the current
/// year and month, all days, and all models. A month or day with no
/// stored data falls back rather than failing (see the hold service).
#[derive(Debug, Clone, Copy, Default, Deserialize, IntoParams)]
pub struct HoldQueryParams {
    /// Calendar year; defaults to the current year.
    pub year: Option<i32>,
    /// Month 1–12; defaults to the current month.
    pub month: Option<u32>,
    /// Day of month 1–31; absent means all days.
    pub day: Option<u32>,
    /// Model identifier; absent means all models.
    pub model: Option<i32>,
}
