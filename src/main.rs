//! hold-analytics server entry point.
//!
//! Starts the Axum HTTP server for extract ingestion and hold KPI queries.

use std::sync::Arc;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use hold_analytics::api;
use hold_analytics::app_state::AppState;
use hold_analytics::config::AnalyticsConfig;
use hold_analytics::persistence::PostgresStore;
use hold_analytics::service::{HoldService, IngestService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = AnalyticsConfig::from_env()?;
    tracing::info!(addr = %config.listen_addr, "starting hold-analytics");

    // Connect persistence layer
    let store = PostgresStore::connect(&config).await?;
    if config.run_migrations {
        sqlx::migrate!("./migrations").run(store.pool()).await?;
        tracing::info!("migrations applied");
    }

    // Build service layer
    let hold_service = Arc::new(HoldService::new(store.clone()));
    let ingest_service = Arc::new(IngestService::new(store));

    // Build application state
    let app_state = AppState {
        hold_service,
        ingest_service,
    };

    // Build router
    let app = Router::new()
        .merge(api::build_router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
