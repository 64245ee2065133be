// SPDX-FileCopyrightText: 2026 Waauto Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WhatsApp transport over a local whatsapp-web bridge sidecar.
//!
//! The bridge is the external browser-automation process that owns the real
//! WhatsApp session (pairing, crypto, message framing). This crate implements
//! [`Transport`] against its small HTTP contract:
//!
//! - `POST {url}/session/start` `{callback_url}` -- begin a session, events
//!   flow back to the callback
//! - `POST {url}/send` `{chat_id, body, media?}` -- deliver one message,
//!   media as base64
//! - `POST {url}/logout` -- drop the session so the next start re-pairs
//!
//! Events arrive as signed JSON POSTs on the local callback listener (see
//! [`hook`]). The last-known connection snapshot is kept here and updated
//! from events before they are forwarded.

pub mod hook;
pub mod qr;

use std::sync::Arc;

use arc_swap::ArcSwap;
use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::Serialize;
use tokio::sync::{Mutex, mpsc};

use waauto_config::model::BridgeConfig;
use waauto_core::error::WaautoError;
use waauto_core::traits::Transport;
use waauto_core::types::{MediaRef, StatusSnapshot, TransportEvent};

use crate::hook::HookState;

/// Transport implementation backed by the bridge sidecar.
pub struct WwebTransport {
    config: BridgeConfig,
    http: reqwest::Client,
    snapshot: Arc<ArcSwap<StatusSnapshot>>,
    event_tx: mpsc::Sender<TransportEvent>,
    event_rx: Mutex<mpsc::Receiver<TransportEvent>>,
    listener_handle: Mutex<Option<tokio::task::JoinHandle<()>>>,
}

#[derive(Serialize)]
struct SessionStartBody {
    callback_url: String,
}

#[derive(Serialize)]
struct SendBody<'a> {
    chat_id: &'a str,
    body: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    media: Option<SendMedia>,
}

#[derive(Serialize)]
struct SendMedia {
    data: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    filename: Option<String>,
}

impl WwebTransport {
    pub fn new(config: BridgeConfig) -> Self {
        let (event_tx, event_rx) = mpsc::channel(256);
        Self {
            config,
            http: reqwest::Client::new(),
            snapshot: Arc::new(ArcSwap::from_pointee(StatusSnapshot::default())),
            event_tx,
            event_rx: Mutex::new(event_rx),
            listener_handle: Mutex::new(None),
        }
    }

    fn callback_url(&self) -> String {
        format!(
            "http://{}:{}/hook",
            self.config.callback_host, self.config.callback_port
        )
    }

    /// Record a bridge-level error in the snapshot without changing status.
    fn record_error(&self, message: String) {
        let current = self.snapshot.load();
        self.snapshot.store(Arc::new(StatusSnapshot {
            status: current.status,
            info: current.info.clone(),
            error: Some(message),
        }));
    }
}

#[async_trait]
impl Transport for WwebTransport {
    /// Start the callback listener and ask the bridge to begin a session.
    ///
    /// A bridge that is down at startup is not fatal: the failure is recorded
    /// in the snapshot for the dashboard and the listener keeps waiting.
    /// A callback bind failure IS fatal: without the listener no event would
    /// ever arrive.
    async fn connect(&self) -> Result<(), WaautoError> {
        let mut handle = self.listener_handle.lock().await;
        if handle.is_some() {
            return Ok(());
        }

        if self.config.webhook_secret.is_none() {
            tracing::warn!("bridge webhook secret not configured -- accepting unsigned callbacks");
        }

        let state = HookState {
            secret: self.config.webhook_secret.clone(),
            event_tx: self.event_tx.clone(),
            snapshot: Arc::clone(&self.snapshot),
        };
        let addr = format!(
            "{}:{}",
            self.config.callback_host, self.config.callback_port
        );
        let listener =
            tokio::net::TcpListener::bind(&addr)
                .await
                .map_err(|e| WaautoError::Channel {
                    message: format!("failed to bind callback listener on {addr}: {e}"),
                    source: Some(Box::new(e)),
                })?;
        tracing::info!(addr = %addr, "bridge callback listener bound");

        let app = hook::router(state);
        *handle = Some(tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!(error = %e, "callback listener error");
            }
        }));
        drop(handle);

        let start = self
            .http
            .post(format!("{}/session/start", self.config.url))
            .json(&SessionStartBody {
                callback_url: self.callback_url(),
            })
            .send()
            .await;
        match start {
            Ok(response) if response.status().is_success() => {
                tracing::info!(bridge = %self.config.url, "bridge session starting");
            }
            Ok(response) => {
                let message = format!("bridge refused session start: {}", response.status());
                tracing::error!("{message}");
                self.record_error(message);
            }
            Err(e) => {
                let message = format!("bridge unreachable: {e}");
                tracing::error!("{message}");
                self.record_error(message);
            }
        }

        Ok(())
    }

    fn status(&self) -> StatusSnapshot {
        self.snapshot.load().as_ref().clone()
    }

    async fn send_message(
        &self,
        chat_id: &str,
        body: &str,
        media: Option<&MediaRef>,
    ) -> Result<(), WaautoError> {
        let media = match media {
            Some(media) => {
                let bytes =
                    tokio::fs::read(&media.path)
                        .await
                        .map_err(|e| WaautoError::Send {
                            message: format!(
                                "failed to read media file {}: {e}",
                                media.path.display()
                            ),
                            source: Some(Box::new(e)),
                        })?;
                Some(SendMedia {
                    data: STANDARD.encode(bytes),
                    mime_type: media.mime_type.clone(),
                    filename: media.filename.clone(),
                })
            }
            None => None,
        };

        let response = self
            .http
            .post(format!("{}/send", self.config.url))
            .json(&SendBody {
                chat_id,
                body,
                media,
            })
            .send()
            .await
            .map_err(|e| WaautoError::Send {
                message: format!("bridge send request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(WaautoError::Send {
                message: format!("bridge rejected send ({status}): {detail}"),
                source: None,
            });
        }
        Ok(())
    }

    async fn receive(&self) -> Result<TransportEvent, WaautoError> {
        let mut rx = self.event_rx.lock().await;
        rx.recv().await.ok_or_else(|| WaautoError::Channel {
            message: "bridge event channel closed".to_string(),
            source: None,
        })
    }

    async fn logout(&self) -> Result<(), WaautoError> {
        let response = self
            .http
            .post(format!("{}/logout", self.config.url))
            .send()
            .await
            .map_err(|e| WaautoError::Channel {
                message: format!("bridge logout request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        if !response.status().is_success() {
            return Err(WaautoError::Channel {
                message: format!("bridge refused logout: {}", response.status()),
                source: None,
            });
        }

        self.snapshot.store(Arc::new(StatusSnapshot::default()));
        tracing::info!("whatsapp session logged out");
        Ok(())
    }
}
