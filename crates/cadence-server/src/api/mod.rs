//! HTTP API
//!
//! The review endpoint plus a small JSON API for seeding and inspecting
//! items. Handlers share one `Arc<Storage>` and run SQLite work on the
//! blocking pool.

pub mod error;
pub mod handlers;
pub mod state;

use std::sync::Arc;

use axum::http::{HeaderValue, Request};
use axum::routing::{get, post};
use axum::Router;
use cadence_core::Storage;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, info_span, warn};
use uuid::Uuid;

use crate::config::ServerConfig;
pub use error::ApiError;
pub use state::AppState;

/// Build the axum router with all routes
pub fn build_router(state: AppState, cors_origins: &[String]) -> Router {
    Router::new()
        // Review
        .route("/review/sm2", post(handlers::review_sm2))
        // Items
        .route("/api/items", post(handlers::create_item))
        .route("/api/items/{id}", get(handlers::get_item))
        .route("/api/items/{id}/preview", get(handlers::preview_item))
        .route("/api/items/{id}/sessions", get(handlers::item_sessions))
        .route("/api/users/{user_id}/sessions", get(handlers::user_sessions))
        .route("/api/review-queue", get(handlers::review_queue))
        // Stats & health
        .route("/api/stats", get(handlers::get_stats))
        .route("/api/health", get(handlers::health_check))
        .layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
                        info_span!(
                            "http_request",
                            request_id = %Uuid::new_v4(),
                            method = %request.method(),
                            uri = %request.uri(),
                        )
                    }),
                )
                .concurrency_limit(50)
                .layer(cors_layer(cors_origins)),
        )
        .with_state(state)
}

/// Any origin, method and header unless a list of origins is configured
fn cors_layer(origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() {
        return cors.allow_origin(Any);
    }

    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    cors.allow_origin(AllowOrigin::list(parsed))
}

/// Serve the API until Ctrl+C or SIGTERM
pub async fn serve(config: &ServerConfig, storage: Arc<Storage>) -> anyhow::Result<()> {
    let addr = config.bind_addr()?;
    let app = build_router(AppState::new(storage), &config.cors_origins);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(
        "Cadence listening on http://{} (quality policy: {})",
        addr, config.quality_policy
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("HTTP server stopped");
    Ok(())
}

/// Close storage once the server has released its handles
pub fn shutdown_storage(storage: Arc<Storage>) {
    match Arc::try_unwrap(storage) {
        Ok(storage) => {
            if let Err(e) = storage.close() {
                warn!("Failed to close storage cleanly: {}", e);
            }
        }
        Err(_) => warn!("Storage still shared at shutdown; skipping WAL checkpoint"),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
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
                warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}
