// SPDX-FileCopyrightText: 2026 Waauto Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Event callback listener.
//!
//! The bridge sidecar pushes lifecycle and message events by POSTing JSON to
//! `/hook` on a local listener. Each request carries an `X-Hook-Signature`
//! header: the lowercase hex HMAC-SHA256 of the raw body under the shared
//! webhook secret. When no secret is configured, verification is skipped
//! (loopback-only deployments) and a warning is logged at connect time.

use std::sync::Arc;

use arc_swap::ArcSwap;
use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use tokio::sync::mpsc;

use waauto_core::types::{
    ClientInfo, ConnectionStatus, IncomingMessage, StatusSnapshot, TransportEvent,
};

use crate::qr;

/// Signature header set by the bridge.
pub(crate) const SIGNATURE_HEADER: &str = "x-hook-signature";

/// Shared state for the callback listener.
#[derive(Clone)]
pub(crate) struct HookState {
    pub(crate) secret: Option<String>,
    pub(crate) event_tx: mpsc::Sender<TransportEvent>,
    pub(crate) snapshot: Arc<ArcSwap<StatusSnapshot>>,
}

/// Events as the bridge serializes them.
#[derive(Debug, Deserialize, PartialEq)]
#[serde(tag = "event", rename_all = "snake_case")]
pub(crate) enum HookEvent {
    Qr {
        code: String,
    },
    Ready {
        info: ClientInfo,
    },
    Authenticated,
    AuthFailure {
        reason: String,
    },
    Disconnected {
        reason: String,
    },
    Message {
        from: String,
        #[serde(default)]
        body: String,
        #[serde(default)]
        has_media: bool,
        #[serde(default)]
        timestamp: i64,
        /// Messages echoed back for our own sends; never auto-replied to.
        #[serde(default)]
        from_me: bool,
        /// Status broadcasts; never auto-replied to.
        #[serde(default)]
        is_status: bool,
    },
}

/// Build the callback router.
pub(crate) fn router(state: HookState) -> Router {
    Router::new().route("/hook", post(post_hook)).with_state(state)
}

/// POST /hook
async fn post_hook(
    State(state): State<HookState>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    if let Some(secret) = &state.secret {
        let signature = headers
            .get(SIGNATURE_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        if !verify_signature(secret, &body, signature) {
            tracing::warn!("rejected hook delivery with bad signature");
            return StatusCode::UNAUTHORIZED;
        }
    }

    let event: HookEvent = match serde_json::from_slice(&body) {
        Ok(event) => event,
        Err(e) => {
            tracing::warn!(error = %e, "undecodable hook delivery");
            return StatusCode::BAD_REQUEST;
        }
    };

    apply_event(&state, event).await;
    StatusCode::NO_CONTENT
}

/// Update the connection snapshot and forward the event to the consumer.
pub(crate) async fn apply_event(state: &HookState, event: HookEvent) {
    let forwarded = match event {
        HookEvent::Qr { code } => {
            state.snapshot.store(Arc::new(StatusSnapshot {
                status: ConnectionStatus::Qr,
                info: None,
                error: None,
            }));
            match qr::qr_data_url(&code) {
                Ok(data_url) => Some(TransportEvent::Qr(data_url)),
                Err(e) => {
                    tracing::warn!(error = %e, "QR render failed, dropping event");
                    None
                }
            }
        }
        HookEvent::Ready { info } => {
            state.snapshot.store(Arc::new(StatusSnapshot {
                status: ConnectionStatus::Connected,
                info: Some(info.clone()),
                error: None,
            }));
            Some(TransportEvent::Ready(info))
        }
        HookEvent::Authenticated => Some(TransportEvent::Authenticated),
        HookEvent::AuthFailure { reason } => {
            state.snapshot.store(Arc::new(StatusSnapshot {
                status: ConnectionStatus::Disconnected,
                info: None,
                error: Some(format!("auth failure: {reason}")),
            }));
            Some(TransportEvent::AuthFailure(reason))
        }
        HookEvent::Disconnected { reason } => {
            state.snapshot.store(Arc::new(StatusSnapshot {
                status: ConnectionStatus::Disconnected,
                info: None,
                error: None,
            }));
            Some(TransportEvent::Disconnected(reason))
        }
        HookEvent::Message {
            from,
            body,
            has_media,
            timestamp,
            from_me,
            is_status,
        } => {
            if from_me || is_status {
                None
            } else {
                Some(TransportEvent::Message(IncomingMessage {
                    from,
                    body,
                    has_media,
                    timestamp,
                }))
            }
        }
    };

    if let Some(event) = forwarded {
        if state.event_tx.send(event).await.is_err() {
            tracing::warn!("event channel closed, dropping bridge event");
        }
    }
}

/// Constant-time verification of the hook signature.
pub(crate) fn verify_signature(secret: &str, body: &[u8], signature_hex: &str) -> bool {
    let Ok(signature) = hex::decode(signature_hex) else {
        return false;
    };
    let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&signature).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign(secret: &str, body: &[u8]) -> String {
        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(body);
        hex::encode(mac.finalize().into_bytes())
    }

    fn make_state(secret: Option<&str>) -> (HookState, mpsc::Receiver<TransportEvent>) {
        let (event_tx, event_rx) = mpsc::channel(16);
        (
            HookState {
                secret: secret.map(|s| s.to_string()),
                event_tx,
                snapshot: Arc::new(ArcSwap::from_pointee(StatusSnapshot::default())),
            },
            event_rx,
        )
    }

    #[test]
    fn signature_round_trip_verifies() {
        let body = br#"{"event":"authenticated"}"#;
        let signature = sign("hook-secret", body);
        assert!(verify_signature("hook-secret", body, &signature));
    }

    #[test]
    fn tampered_body_fails_verification() {
        let signature = sign("hook-secret", b"original");
        assert!(!verify_signature("hook-secret", b"tampered", &signature));
        assert!(!verify_signature("other-secret", b"original", &signature));
        assert!(!verify_signature("hook-secret", b"original", "not-hex"));
    }

    #[test]
    fn hook_events_deserialize() {
        let event: HookEvent = serde_json::from_str(r#"{"event":"qr","code":"2@abc"}"#).unwrap();
        assert_eq!(event, HookEvent::Qr { code: "2@abc".to_string() });

        let event: HookEvent = serde_json::from_str(
            r#"{"event":"message","from":"111@c.us","body":"hi","timestamp":1700000000}"#,
        )
        .unwrap();
        match event {
            HookEvent::Message { from, body, has_media, from_me, .. } => {
                assert_eq!(from, "111@c.us");
                assert_eq!(body, "hi");
                assert!(!has_media);
                assert!(!from_me);
            }
            other => panic!("expected message, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn qr_event_updates_snapshot_and_forwards_data_url() {
        let (state, mut events) = make_state(None);
        apply_event(
            &state,
            HookEvent::Qr {
                code: "2@pairing-payload".to_string(),
            },
        )
        .await;

        assert_eq!(state.snapshot.load().status, ConnectionStatus::Qr);
        match events.recv().await.unwrap() {
            TransportEvent::Qr(data_url) => {
                assert!(data_url.starts_with("data:image/svg+xml;base64,"));
            }
            other => panic!("expected qr event, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn ready_event_connects_with_identity() {
        let (state, mut events) = make_state(None);
        let info = ClientInfo {
            pushname: "Operator".to_string(),
            phone: "15551234567".to_string(),
            platform: "android".to_string(),
        };
        apply_event(&state, HookEvent::Ready { info: info.clone() }).await;

        let snapshot = state.snapshot.load();
        assert_eq!(snapshot.status, ConnectionStatus::Connected);
        assert_eq!(snapshot.info.as_ref(), Some(&info));
        assert_eq!(events.recv().await.unwrap(), TransportEvent::Ready(info));
    }

    #[tokio::test]
    async fn auth_failure_records_error_in_snapshot() {
        let (state, mut events) = make_state(None);
        apply_event(
            &state,
            HookEvent::AuthFailure {
                reason: "session expired".to_string(),
            },
        )
        .await;

        let snapshot = state.snapshot.load();
        assert_eq!(snapshot.status, ConnectionStatus::Disconnected);
        assert!(snapshot.error.as_deref().unwrap().contains("session expired"));
        assert_eq!(
            events.recv().await.unwrap(),
            TransportEvent::AuthFailure("session expired".to_string())
        );
    }

    #[tokio::test]
    async fn own_and_status_messages_are_filtered() {
        let (state, mut events) = make_state(None);
        apply_event(
            &state,
            HookEvent::Message {
                from: "me@c.us".to_string(),
                body: "own message".to_string(),
                has_media: false,
                timestamp: 0,
                from_me: true,
                is_status: false,
            },
        )
        .await;
        apply_event(
            &state,
            HookEvent::Message {
                from: "status@broadcast".to_string(),
                body: "story".to_string(),
                has_media: false,
                timestamp: 0,
                from_me: false,
                is_status: true,
            },
        )
        .await;
        apply_event(
            &state,
            HookEvent::Message {
                from: "111@c.us".to_string(),
                body: "real".to_string(),
                has_media: false,
                timestamp: 0,
                from_me: false,
                is_status: false,
            },
        )
        .await;

        // Only the real inbound message came through.
        match events.recv().await.unwrap() {
            TransportEvent::Message(msg) => assert_eq!(msg.body, "real"),
            other => panic!("expected message, got {other:?}"),
        }
        assert!(events.try_recv().is_err());
    }
}
