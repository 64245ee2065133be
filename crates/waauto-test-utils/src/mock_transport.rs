// SPDX-FileCopyrightText: 2026 Waauto Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock transport for deterministic testing.
//!
//! `MockTransport` implements [`Transport`] with a settable connection
//! snapshot, captured outbound sends, per-chat-id failure injection, and
//! injectable events for the relay path.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};

use waauto_core::error::WaautoError;
use waauto_core::traits::Transport;
use waauto_core::types::{
    ConnectionStatus, MediaRef, StatusSnapshot, TransportEvent,
};

/// One captured outbound send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub chat_id: String,
    pub body: String,
    pub media: Option<MediaRef>,
}

/// A mock protocol client for testing.
///
/// Provides three controls:
/// - **snapshot**: `set_connected()` / `set_status()` drive the connection state
/// - **sent**: messages passed to `send_message()` are captured for assertion
/// - **failures**: chat ids registered via `fail_sends_to()` make `send_message()` error
pub struct MockTransport {
    snapshot: std::sync::Mutex<StatusSnapshot>,
    sent: Arc<Mutex<Vec<SentMessage>>>,
    failures: Arc<Mutex<HashSet<String>>>,
    events: Arc<Mutex<VecDeque<TransportEvent>>>,
    notify: Arc<Notify>,
}

impl MockTransport {
    /// Create a mock transport in the disconnected state.
    pub fn new() -> Self {
        Self {
            snapshot: std::sync::Mutex::new(StatusSnapshot::default()),
            sent: Arc::new(Mutex::new(Vec::new())),
            failures: Arc::new(Mutex::new(HashSet::new())),
            events: Arc::new(Mutex::new(VecDeque::new())),
            notify: Arc::new(Notify::new()),
        }
    }

    /// Create a mock transport already in the connected state.
    pub fn connected() -> Self {
        let transport = Self::new();
        transport.set_status(ConnectionStatus::Connected);
        transport
    }

    /// Set the connection state reported by `status()`.
    pub fn set_status(&self, status: ConnectionStatus) {
        self.snapshot.lock().unwrap().status = status;
    }

    /// Make every future send to `chat_id` fail at the protocol layer.
    pub async fn fail_sends_to(&self, chat_id: &str) {
        self.failures.lock().await.insert(chat_id.to_string());
    }

    /// All messages captured by `send_message()`, in send order.
    pub async fn sent_messages(&self) -> Vec<SentMessage> {
        self.sent.lock().await.clone()
    }

    /// Count of captured sends.
    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }

    /// Inject an event to be returned by the next `receive()` call.
    pub async fn inject_event(&self, event: TransportEvent) {
        self.events.lock().await.push_back(event);
        self.notify.notify_one();
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn connect(&self) -> Result<(), WaautoError> {
        Ok(())
    }

    fn status(&self) -> StatusSnapshot {
        self.snapshot.lock().unwrap().clone()
    }

    async fn send_message(
        &self,
        chat_id: &str,
        body: &str,
        media: Option<&MediaRef>,
    ) -> Result<(), WaautoError> {
        if self.failures.lock().await.contains(chat_id) {
            return Err(WaautoError::Send {
                message: format!("injected failure for {chat_id}"),
                source: None,
            });
        }
        self.sent.lock().await.push(SentMessage {
            chat_id: chat_id.to_string(),
            body: body.to_string(),
            media: media.cloned(),
        });
        Ok(())
    }

    async fn receive(&self) -> Result<TransportEvent, WaautoError> {
        loop {
            {
                let mut queue = self.events.lock().await;
                if let Some(event) = queue.pop_front() {
                    return Ok(event);
                }
            }
            self.notify.notified().await;
        }
    }

    async fn logout(&self) -> Result<(), WaautoError> {
        self.set_status(ConnectionStatus::Disconnected);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use waauto_core::types::IncomingMessage;

    #[tokio::test]
    async fn starts_disconnected_and_can_connect() {
        let transport = MockTransport::new();
        assert_eq!(transport.status().status, ConnectionStatus::Disconnected);

        transport.set_status(ConnectionStatus::Connected);
        assert_eq!(transport.status().status, ConnectionStatus::Connected);
    }

    #[tokio::test]
    async fn send_captures_messages_in_order() {
        let transport = MockTransport::connected();
        transport.send_message("111@c.us", "first", None).await.unwrap();
        transport.send_message("222@c.us", "second", None).await.unwrap();

        let sent = transport.sent_messages().await;
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].chat_id, "111@c.us");
        assert_eq!(sent[1].body, "second");
    }

    #[tokio::test]
    async fn injected_failures_reject_sends() {
        let transport = MockTransport::connected();
        transport.fail_sends_to("222@c.us").await;

        assert!(transport.send_message("111@c.us", "ok", None).await.is_ok());
        let err = transport
            .send_message("222@c.us", "doomed", None)
            .await
            .unwrap_err();
        assert!(matches!(err, WaautoError::Send { .. }));
        assert_eq!(transport.sent_count().await, 1);
    }

    #[tokio::test]
    async fn receive_returns_injected_events() {
        let transport = MockTransport::new();
        transport
            .inject_event(TransportEvent::Message(IncomingMessage {
                from: "111@c.us".to_string(),
                body: "hello".to_string(),
                has_media: false,
                timestamp: 1_700_000_000,
            }))
            .await;

        match transport.receive().await.unwrap() {
            TransportEvent::Message(msg) => assert_eq!(msg.body, "hello"),
            other => panic!("expected message event, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn logout_drops_the_link() {
        let transport = MockTransport::connected();
        transport.logout().await.unwrap();
        assert_eq!(transport.status().status, ConnectionStatus::Disconnected);
    }
}
