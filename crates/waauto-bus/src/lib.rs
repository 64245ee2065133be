// SPDX-FileCopyrightText: 2026 Waauto Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed event bus relaying pipeline events to dashboard sessions.
//!
//! Every event that reaches a connected dashboard flows through
//! [`EventBus::publish`]. The bus is a thin wrapper over
//! `tokio::sync::broadcast`: publishing never blocks and tolerates having no
//! subscribers (events are simply dropped, matching a dashboard nobody is
//! watching).

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use waauto_core::types::{ClientInfo, ConnectionStatus, ScheduleStatus};

/// Events pushed live to every connected dashboard session.
///
/// Serialized with a `type` tag, e.g.
/// `{"type":"bulk_complete","sent":9,"failed":1,"total":10}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DashboardEvent {
    /// Connection lifecycle snapshot.
    Status {
        status: ConnectionStatus,
        #[serde(skip_serializing_if = "Option::is_none")]
        info: Option<ClientInfo>,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    /// A pairing QR code as a data URL, ready for an `<img>` tag.
    Qr { data_url: String },
    /// The client finished pairing.
    Ready { info: ClientInfo },
    /// Session credentials were rejected.
    AuthFailure { reason: String },
    /// Cumulative bulk-send progress, published after every attempt.
    BulkProgress {
        total: usize,
        sent: usize,
        failed: usize,
        remaining: usize,
        current: String,
    },
    /// Bulk-send summary, published exactly once per run.
    BulkComplete {
        sent: usize,
        failed: usize,
        total: usize,
    },
    /// A scheduled message reached a terminal state.
    ScheduledSent {
        id: i64,
        phone: String,
        status: ScheduleStatus,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    /// An inbound message arrived.
    MessageReceived {
        from: String,
        body: String,
        timestamp: i64,
    },
}

/// Broadcast fan-out to dashboard sessions.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<DashboardEvent>,
}

impl EventBus {
    /// Create a bus that buffers up to `capacity` events per subscriber.
    /// Slow subscribers lag and skip, they never block publishers.
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Publish an event to every current subscriber.
    pub fn publish(&self, event: DashboardEvent) {
        // A send error only means nobody is subscribed right now.
        if self.tx.send(event).is_err() {
            tracing::trace!("dashboard event dropped (no subscribers)");
        }
    }

    /// Subscribe to all events published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<DashboardEvent> {
        self.tx.subscribe()
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_reaches_all_subscribers() {
        let bus = EventBus::new(16);
        let mut a = bus.subscribe();
        let mut b = bus.subscribe();

        bus.publish(DashboardEvent::BulkComplete {
            sent: 2,
            failed: 1,
            total: 3,
        });

        let expected = DashboardEvent::BulkComplete {
            sent: 2,
            failed: 1,
            total: 3,
        };
        assert_eq!(a.recv().await.unwrap(), expected);
        assert_eq!(b.recv().await.unwrap(), expected);
    }

    #[tokio::test]
    async fn publish_without_subscribers_does_not_panic() {
        let bus = EventBus::new(16);
        bus.publish(DashboardEvent::AuthFailure {
            reason: "nobody listening".to_string(),
        });
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn events_serialize_with_type_tag() {
        let json = serde_json::to_string(&DashboardEvent::Qr {
            data_url: "data:image/svg+xml;base64,AAAA".to_string(),
        })
        .unwrap();
        assert!(json.contains(r#""type":"qr""#));
        assert!(json.contains("data_url"));

        let json = serde_json::to_string(&DashboardEvent::BulkProgress {
            total: 5,
            sent: 2,
            failed: 1,
            remaining: 2,
            current: "15551234567".to_string(),
        })
        .unwrap();
        assert!(json.contains(r#""type":"bulk_progress""#));
        assert!(json.contains(r#""remaining":2"#));
    }

    #[test]
    fn scheduled_event_omits_absent_error() {
        let json = serde_json::to_string(&DashboardEvent::ScheduledSent {
            id: 7,
            phone: "111".to_string(),
            status: waauto_core::ScheduleStatus::Sent,
            error: None,
        })
        .unwrap();
        assert!(json.contains(r#""type":"scheduled_sent""#));
        assert!(json.contains(r#""status":"sent""#));
        assert!(!json.contains("error"));
    }

    #[test]
    fn status_event_round_trips() {
        let event = DashboardEvent::Status {
            status: ConnectionStatus::Qr,
            info: None,
            error: None,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(json, r#"{"type":"status","status":"qr"}"#);
        let parsed: DashboardEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, event);
    }
}
