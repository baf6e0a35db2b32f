//! Hold KPI query handler.

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::HoldQueryParams;
use crate::app_state::AppState;
use crate::error::{AnalyticsError, ErrorResponse};
use crate::service::HoldContext;

/// `GET /hold` — Floor and drill-down KPI snapshot.
///
/// Always succeeds for well-formed requests: missing reference data
/// (no exchange rate, empty period) degrades to zero-valued figures.
///
/// # Errors
///
/// Returns [`AnalyticsError::Persistence`] on storage failure.
#[utoipa::path(
    get,
    path = "/api/v1/hold",
    tag = "Hold",
    summary = "Compute the hold KPI snapshot",
    description = "Computes filter options, global and filtered KPI tiers, and the per-model activity sidebar for the requested year/month/day/model selection.",
    params(HoldQueryParams),
    responses(
        (status = 200, description = "KPI snapshot", body = HoldContext),
        (status = 500, description = "Storage failure", body = ErrorResponse),
    )
)]
pub async fn get_hold_context(
    State(state): State<AppState>,
    Query(params): Query<HoldQueryParams>,
) -> Result<impl IntoResponse, AnalyticsError> {
    let context = state
        .hold_service
        .build_context(params.year, params.month, params.day, params.model)
        .await?;
    Ok(Json(context))
}

/// Hold query routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/hold", get(get_hold_context))
}
