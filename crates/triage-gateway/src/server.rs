// SPDX-FileCopyrightText: 2026 Triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the query/update surface.

use std::future::Future;
use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post, put},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use triage_config::{GatewayConfig, IngestConfig};
use triage_core::{MessageClassifier, StorageAdapter, TriageError};

use crate::handlers;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    /// Record store backing every route.
    pub storage: Arc<dyn StorageAdapter>,
    /// Classifier used by batch runs started over HTTP.
    pub classifier: Arc<dyn MessageClassifier>,
    /// Checkpoint and failure policy for batch runs started over HTTP.
    pub ingest: IngestConfig,
}

/// Bind address for the gateway.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl From<&GatewayConfig> for ServerConfig {
    fn from(config: &GatewayConfig) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
        }
    }
}

/// Builds the router with every route and middleware layer.
///
/// Routes:
/// - GET /
/// - GET /health
/// - GET /messages
/// - PUT /messages/{message_id}
/// - POST /messages/process
/// - GET /stats
pub fn build_router(state: GatewayState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::get_health))
        .route("/messages", get(handlers::list_messages))
        .route("/messages/process", post(handlers::process_batch))
        .route("/messages/{message_id}", put(handlers::update_message))
        .route("/stats", get(handlers::get_stats))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Serves the gateway until `shutdown` resolves.
pub async fn start_server(
    config: &ServerConfig,
    state: GatewayState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), TriageError> {
    let app = build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| TriageError::Internal(format!("failed to bind gateway to {addr}: {e}")))?;

    tracing::info!("Gateway server listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| TriageError::Internal(format!("gateway server error: {e}")))?;

    tracing::info!("Gateway server stopped");
    Ok(())
}
