// SPDX-FileCopyrightText: 2026 Waauto Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WebSocket relay pushing dashboard events to connected sessions.
//!
//! Server -> client frames are JSON-serialized [`DashboardEvent`]s, e.g.
//! `{"type":"status","status":"connected","info":{...}}`. A freshly connected
//! session immediately receives the current connection snapshot, then every
//! bus event until it departs. Client -> server frames are ignored: the
//! dashboard mutates state through the REST API only.

use axum::{
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::broadcast;

use waauto_bus::DashboardEvent;

use crate::server::GatewayState;

/// Query parameters for the WebSocket handshake.
#[derive(Debug, Deserialize)]
pub struct WsParams {
    #[serde(default)]
    pub token: Option<String>,
}

/// WebSocket upgrade handler.
///
/// When a bearer token is configured, the handshake must carry it as a
/// `?token=` query parameter (browsers cannot set headers on WebSocket
/// connections).
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<WsParams>,
    State(state): State<GatewayState>,
) -> Response {
    if let Some(expected) = &state.bearer_token {
        if params.token.as_deref() != Some(expected.as_str()) {
            return StatusCode::UNAUTHORIZED.into_response();
        }
    }
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

/// Handle an individual dashboard session.
async fn handle_socket(socket: WebSocket, state: GatewayState) {
    let (mut sender, mut receiver) = socket.split();

    // Seed the session with the current connection snapshot.
    let snapshot = state.transport.status();
    let initial = DashboardEvent::Status {
        status: snapshot.status,
        info: snapshot.info,
        error: snapshot.error,
    };
    match serde_json::to_string(&initial) {
        Ok(json) => {
            if sender.send(Message::Text(json.into())).await.is_err() {
                return;
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to serialize status snapshot");
            return;
        }
    }

    let mut events = state.bus.subscribe();
    let forward_task = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    let Ok(json) = serde_json::to_string(&event) else {
                        continue;
                    };
                    if sender.send(Message::Text(json.into())).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "dashboard session lagged, events skipped");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    // Drain the client side until it closes.
    while let Some(Ok(msg)) = receiver.next().await {
        match msg {
            Message::Close(_) => break,
            _ => {} // The dashboard never sends anything meaningful.
        }
    }

    forward_task.abort();
    tracing::debug!("dashboard session closed");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ws_params_deserialize_with_and_without_token() {
        let params: WsParams = serde_json::from_str("{}").unwrap();
        assert!(params.token.is_none());

        let params: WsParams = serde_json::from_str(r#"{"token": "abc"}"#).unwrap();
        assert_eq!(params.token.as_deref(), Some("abc"));
    }
}
