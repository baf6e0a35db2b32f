//! Extract upload handlers: preview and import.

use axum::extract::{Multipart, State};
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};

use crate::api::dto::PreviewResponse;
use crate::app_state::AppState;
use crate::error::{AnalyticsError, ErrorResponse};
use crate::service::IngestReport;

/// `POST /hold/import` — Ingest an uploaded floor-report extract.
///
/// # Errors
///
/// Returns [`AnalyticsError::UnsupportedFormat`] or
/// [`AnalyticsError::SchemaMismatch`] for bad uploads, and
/// [`AnalyticsError::Ingestion`] when the bulk write fails (the batch
/// is rolled back and nothing is persisted).
#[utoipa::path(
    post,
    path = "/api/v1/hold/import",
    tag = "Hold",
    summary = "Ingest a performance extract",
    description = "Parses a legacy xls/xlsx floor report, deduplicates against stored sessions, and bulk-persists new rows in one transaction. Re-uploading the same extract inserts nothing.",
    responses(
        (status = 200, description = "Ingestion report", body = IngestReport),
        (status = 400, description = "Unsupported upload", body = ErrorResponse),
        (status = 422, description = "Template column drift", body = ErrorResponse),
        (status = 500, description = "Bulk write failed, rolled back", body = ErrorResponse),
    )
)]
pub async fn import_extract(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AnalyticsError> {
    let (filename, bytes) = read_upload(&mut multipart).await?;
    let report = state.ingest_service.ingest(&filename, bytes).await?;
    Ok(Json(report))
}

/// `POST /hold/preview` — Normalize an extract without persisting it.
///
/// # Errors
///
/// Returns [`AnalyticsError::UnsupportedFormat`] or
/// [`AnalyticsError::SchemaMismatch`] for bad uploads.
#[utoipa::path(
    post,
    path = "/api/v1/hold/preview",
    tag = "Hold",
    summary = "Preview a performance extract",
    description = "Runs the template normalization pipeline and returns the canonical rows without touching the store.",
    responses(
        (status = 200, description = "Normalized rows", body = PreviewResponse),
        (status = 400, description = "Unsupported upload", body = ErrorResponse),
        (status = 422, description = "Template column drift", body = ErrorResponse),
    )
)]
pub async fn preview_extract(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AnalyticsError> {
    let (filename, bytes) = read_upload(&mut multipart).await?;
    let rows = state.ingest_service.preview(&filename, bytes)?;
    Ok(Json(PreviewResponse::from_rows(rows)))
}

/// Pulls the `file` part out of a multipart upload.
async fn read_upload(multipart: &mut Multipart) -> Result<(String, Vec<u8>), AnalyticsError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AnalyticsError::InvalidRequest(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| AnalyticsError::Validation("file part needs a filename".to_string()))?;
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AnalyticsError::InvalidRequest(e.to_string()))?
            .to_vec();
        return Ok((filename, bytes));
    }
    Err(AnalyticsError::Validation(
        "multipart field 'file' is required".to_string(),
    ))
}

/// Upload routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/hold/import", post(import_extract))
        .route("/hold/preview", post(preview_extract))
}
