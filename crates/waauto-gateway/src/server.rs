// SPDX-FileCopyrightText: 2026 Waauto Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the dashboard surface.

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{delete, get, post, put},
};
use tower_http::cors::CorsLayer;

use waauto_bus::EventBus;
use waauto_config::model::ServerConfig;
use waauto_core::WaautoError;
use waauto_core::traits::Transport;
use waauto_engine::{AutoReply, BulkSender, Dispatcher};
use waauto_storage::Database;

use crate::auth::{AuthConfig, auth_middleware};
use crate::handlers;
use crate::ws;

/// Media uploads are capped at 16 MiB, matching the client's own limit.
pub const MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub db: Database,
    pub transport: Arc<dyn Transport>,
    pub dispatcher: Arc<Dispatcher>,
    pub autoreply: Arc<AutoReply>,
    pub bulk: Arc<BulkSender>,
    pub bus: EventBus,
    /// Directory where bulk media uploads are staged until the run finishes.
    pub upload_dir: PathBuf,
    /// Mirrored from config for the `/ws` query-token check.
    pub bearer_token: Option<String>,
}

/// Start the dashboard HTTP/WebSocket server.
///
/// Routes:
/// - `/api/*` (bearer auth when configured): status, send, bulk-send,
///   auto-replies CRUD + toggle, scheduled CRUD, logs, stats, settings, logout
/// - `/ws` (auth via `?token=` query param, not middleware)
pub async fn start_server(config: &ServerConfig, state: GatewayState) -> Result<(), WaautoError> {
    let auth = AuthConfig {
        bearer_token: config.bearer_token.clone(),
    };

    let api_routes = Router::new()
        .route("/api/status", get(handlers::get_status))
        .route("/api/send", post(handlers::post_send))
        .route("/api/bulk-send", post(handlers::post_bulk_send))
        .route(
            "/api/auto-replies",
            get(handlers::get_auto_replies).post(handlers::post_auto_reply),
        )
        .route(
            "/api/auto-replies/{id}",
            put(handlers::put_auto_reply).delete(handlers::delete_auto_reply),
        )
        .route("/api/auto-replies/toggle", post(handlers::post_auto_reply_toggle))
        .route(
            "/api/scheduled",
            get(handlers::get_scheduled).post(handlers::post_scheduled),
        )
        .route("/api/scheduled/{id}", delete(handlers::delete_scheduled))
        .route("/api/logs", get(handlers::get_logs))
        .route("/api/stats", get(handlers::get_stats))
        .route(
            "/api/settings",
            get(handlers::get_settings).put(handlers::put_settings),
        )
        .route("/api/logout", post(handlers::post_logout))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .route_layer(axum_middleware::from_fn_with_state(auth, auth_middleware))
        .with_state(state.clone());

    // WebSocket route (auth happens during the handshake, not via middleware).
    let ws_routes = Router::new()
        .route("/ws", get(ws::ws_handler))
        .with_state(state);

    let app = Router::new()
        .merge(api_routes)
        .merge(ws_routes)
        .layer(CorsLayer::permissive());

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| WaautoError::Channel {
            message: format!("failed to bind dashboard server to {addr}: {e}"),
            source: Some(Box::new(e)),
        })?;

    tracing::info!("dashboard server listening on {addr}");

    axum::serve(listener, app)
        .await
        .map_err(|e| WaautoError::Channel {
            message: format!("dashboard server error: {e}"),
            source: Some(Box::new(e)),
        })?;

    Ok(())
}
