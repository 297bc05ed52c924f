//! Courier HTTP API
//!
//! HTTP layer for Courier, built with Axum.
//!
//! # Endpoints
//!
//! ## Dispatcher
//! - `GET /` - Server status report
//! - `POST /` - connect / disconnect / message / status events
//! - `OPTIONS /` - CORS preflight
//!
//! ## Function runtime emulation
//! - `POST /invoke` - Serverless event envelope in, response envelope out
//!
//! ## Health
//! - `GET /health/live` - Liveness probe
//! - `GET /health/ready` - Readiness probe
//! - `GET /health` - Full health status
//!
//! # Example
//!
//! ```rust,ignore
//! use courier::api::{serve, AppState};
//! use courier::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::default();
//!     let state = AppState::from_config(&config);
//!     serve(state, &config.server).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod adapter;
pub mod dto;
pub mod error;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use state::AppState;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{any, get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::ServerConfig;

/// Build the API router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    // The dispatcher writes its own CORS headers; only the health routes
    // go through the CORS middleware.
    let health_routes = Router::new()
        .route("/live", get(routes::health::liveness))
        .route("/ready", get(routes::health::readiness))
        .route("/", get(routes::health::full_health))
        .layer(CorsLayer::permissive());

    let max_body_bytes = state.config.max_body_bytes;
    let timeout = Duration::from_secs(state.config.request_timeout_secs);

    let shared_state = Arc::new(state);

    // `/` enforces the body limit itself so oversized requests still get a
    // dispatcher reply; timeouts get the origin header from `ensure_cors`.
    let dispatch_route = any(routes::dispatch::dispatch_http)
        .layer(TimeoutLayer::new(timeout))
        .layer(middleware::map_response_with_state(
            shared_state.clone(),
            routes::dispatch::ensure_cors,
        ));

    let invoke_route = post(routes::invoke::invoke)
        .layer::<_, std::convert::Infallible>(DefaultBodyLimit::max(max_body_bytes))
        .layer(TimeoutLayer::new(timeout));

    Router::new()
        .route("/", dispatch_route)
        .route("/invoke", invoke_route)
        .nest("/health", health_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(shared_state)
}

/// Start the API server
pub async fn serve(state: AppState, config: &ServerConfig) -> Result<(), ApiError> {
    let router = build_router(state);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Courier listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ApiError::Internal(format!("Server error: {}", e)))?;

    tracing::info!("Courier shut down gracefully");
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
                tracing::error!(error = %e, "Failed to install signal handler");
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
