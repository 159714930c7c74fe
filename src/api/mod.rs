//! Metric Discovery REST API
//!
//! HTTP API layer, built with Axum.
//!
//! # Endpoints
//!
//! ## Ingest
//! - `POST /api/v1/discovery` - Index a batch of metric names
//!
//! ## Search
//! - `GET /api/v1/search?tenant=T&query=P` - Single glob pattern
//! - `POST /api/v1/search` - Batch of patterns, de-duplicated
//! - `GET /api/v1/search/next-level?tenant=T&prefix=P` - Next-level enumeration
//!
//! ## Admin
//! - `GET /api/v1/admin/indices` - Active index names
//! - `PUT /api/v1/admin/indices/read` - Read index cutover
//! - `PUT /api/v1/admin/indices/write` - Write index cutover
//! - `POST /api/v1/admin/indices/reset` - Restore configured names
//!
//! ## Health
//! - `GET /health/live` - Liveness probe
//! - `GET /health/ready` - Readiness probe
//!
//! # Example
//!
//! ```rust,ignore
//! use metric_discovery::api::{serve, ApiConfig, AppState};
//! use metric_discovery::config::Config;
//! use metric_discovery::discovery::MetricDiscovery;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load_default();
//!     let discovery = Arc::new(MetricDiscovery::from_config(&config)?);
//!     let api_config = ApiConfig::from(&config.api);
//!
//!     serve(AppState::new(discovery, api_config.clone()), &api_config).await?;
//!     Ok(())
//! }
//! ```

pub mod dto;
pub mod error;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use state::{ApiConfig, AppState};

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Build the API router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        // Ingest routes
        .route("/discovery", post(routes::ingest::ingest_discovery))
        // Search routes
        .route(
            "/search",
            get(routes::search::search).post(routes::search::search_batch),
        )
        .route("/search/next-level", get(routes::search::search_next_level))
        // Admin routes
        .route("/admin/indices", get(routes::admin::get_indices))
        .route("/admin/indices/read", put(routes::admin::set_read_index))
        .route("/admin/indices/write", put(routes::admin::set_write_index))
        .route("/admin/indices/reset", post(routes::admin::reset_indices))
        .layer(DefaultBodyLimit::max(state.config.max_body_size));

    let health_routes = Router::new()
        .route("/live", get(routes::health::liveness))
        .route("/ready", get(routes::health::readiness));

    let shared_state = Arc::new(state);

    Router::new()
        .nest("/api/v1", api_routes)
        .nest("/health", health_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(shared_state)
}

/// Start the API server
pub async fn serve(state: AppState, config: &ApiConfig) -> Result<(), ApiError> {
    let router = build_router(state);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Metric discovery API listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ApiError::Internal(format!("Server error: {}", e)))?;

    tracing::info!("Metric discovery API shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
