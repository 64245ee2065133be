// SPDX-FileCopyrightText: 2026 Waauto Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Sequential bulk fan-out with progress events.
//!
//! Not a job queue: the gateway acknowledges the request with a queued count
//! and the run continues as a detached task, reporting only through the
//! event bus. Recipients are attempted strictly in input order, each fully
//! resolved before the next begins. A failure on one recipient never aborts
//! the rest.

use std::time::Duration;

use waauto_bus::{DashboardEvent, EventBus};
use waauto_core::error::WaautoError;
use waauto_core::types::{Direction, LogKind, LogStatus, MediaRef};
use waauto_storage::Database;
use waauto_storage::queries::{logs, settings};

use crate::dispatcher::{Dispatcher, MEDIA_PLACEHOLDER};

/// Setting key for the fallback inter-message delay.
const DELAY_KEY: &str = "bulk_delay_ms";

/// Fallback when the setting itself is missing or unparseable (matches the
/// value seeded at migration time).
const DEFAULT_DELAY_MS: u64 = 3000;

/// One bulk run, as assembled by the gateway.
#[derive(Debug, Clone)]
pub struct BulkRequest {
    /// Recipients in input order. Duplicates are sent once per occurrence.
    pub phones: Vec<String>,
    pub message: String,
    /// Uploaded media file, deleted when the run finishes.
    pub media: Option<MediaRef>,
    /// Resolved inter-message delay in milliseconds.
    pub delay_ms: u64,
}

/// Sequential bulk sender.
pub struct BulkSender {
    db: Database,
    dispatcher: std::sync::Arc<Dispatcher>,
    bus: EventBus,
}

impl BulkSender {
    pub fn new(db: Database, dispatcher: std::sync::Arc<Dispatcher>, bus: EventBus) -> Self {
        Self {
            db,
            dispatcher,
            bus,
        }
    }

    /// Resolve the effective delay: an explicit non-negative value wins,
    /// anything absent or invalid falls back to the stored setting.
    pub async fn resolve_delay(&self, requested: Option<i64>) -> u64 {
        if let Some(ms) = requested {
            if ms >= 0 {
                return ms as u64;
            }
        }
        match settings::get_setting(&self.db, DELAY_KEY).await {
            Ok(Some(value)) => value.parse().unwrap_or(DEFAULT_DELAY_MS),
            Ok(None) => DEFAULT_DELAY_MS,
            Err(e) => {
                tracing::warn!(error = %e, "failed to read bulk delay setting");
                DEFAULT_DELAY_MS
            }
        }
    }

    /// Run the fan-out to completion.
    ///
    /// Every recipient yields exactly one durable outcome: the dispatcher
    /// records successes, this loop records failures. After the last
    /// recipient the uploaded media file is removed and a single
    /// `bulk_complete` event is published.
    pub async fn run(&self, request: BulkRequest) -> Result<(), WaautoError> {
        let total = request.phones.len();
        let mut sent = 0usize;
        let mut failed = 0usize;

        tracing::info!(total, delay_ms = request.delay_ms, "bulk send started");

        for (index, phone) in request.phones.iter().enumerate() {
            match self
                .dispatcher
                .send(phone, &request.message, request.media.as_ref())
                .await
            {
                Ok(_) => sent += 1,
                Err(e) => {
                    failed += 1;
                    let kind = if request.media.is_some() {
                        LogKind::Media
                    } else {
                        LogKind::Text
                    };
                    let logged = if request.message.is_empty() {
                        MEDIA_PLACEHOLDER
                    } else {
                        request.message.as_str()
                    };
                    logs::append_log(&self.db, phone, logged, Direction::Sent, kind, LogStatus::Failed)
                        .await?;
                    tracing::warn!(phone = %phone, error = %e, "bulk send attempt failed");
                }
            }

            self.bus.publish(DashboardEvent::BulkProgress {
                total,
                sent,
                failed,
                remaining: total - sent - failed,
                current: phone.clone(),
            });

            // Delay between messages, not after the last.
            if index + 1 < total && request.delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(request.delay_ms)).await;
            }
        }

        if let Some(media) = &request.media {
            if let Err(e) = tokio::fs::remove_file(&media.path).await {
                tracing::warn!(path = %media.path.display(), error = %e, "failed to remove uploaded media");
            }
        }

        self.bus.publish(DashboardEvent::BulkComplete {
            sent,
            failed,
            total,
        });
        tracing::info!(sent, failed, total, "bulk send complete");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::tempdir;
    use waauto_config::model::StorageConfig;
    use waauto_test_utils::MockTransport;

    async fn setup() -> (Arc<MockTransport>, BulkSender, Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let config = StorageConfig {
            database_path: dir.path().join("test.db").to_str().unwrap().to_string(),
            wal_mode: true,
        };
        let db = Database::open(&config).await.unwrap();
        let transport = Arc::new(MockTransport::connected());
        let dispatcher = Arc::new(Dispatcher::new(transport.clone(), db.clone()));
        let bulk = BulkSender::new(db.clone(), dispatcher, EventBus::new(64));
        (transport, bulk, db, dir)
    }

    fn request(phones: &[&str], message: &str, delay_ms: u64) -> BulkRequest {
        BulkRequest {
            phones: phones.iter().map(|p| p.to_string()).collect(),
            message: message.to_string(),
            media: None,
            delay_ms,
        }
    }

    #[tokio::test]
    async fn every_recipient_yields_exactly_one_outcome() {
        let (transport, bulk, db, _dir) = setup().await;
        transport.fail_sends_to("222@c.us").await;

        let mut events = bulk.bus.subscribe();
        bulk.run(request(&["111", "222"], "hello", 0)).await.unwrap();

        // One success, one failure, two log rows.
        let rows = logs::list_logs(&db, 10).await.unwrap();
        assert_eq!(rows.len(), 2);
        let failed_row = rows.iter().find(|r| r.phone == "222").unwrap();
        assert_eq!(failed_row.status, LogStatus::Failed);
        let sent_row = rows.iter().find(|r| r.phone == "111").unwrap();
        assert_eq!(sent_row.status, LogStatus::Sent);

        // Two progress events, then exactly one completion.
        match events.recv().await.unwrap() {
            DashboardEvent::BulkProgress { sent, failed, remaining, current, total } => {
                assert_eq!((total, sent, failed, remaining), (2, 1, 0, 1));
                assert_eq!(current, "111");
            }
            other => panic!("expected bulk_progress, got {other:?}"),
        }
        match events.recv().await.unwrap() {
            DashboardEvent::BulkProgress { sent, failed, remaining, current, .. } => {
                assert_eq!((sent, failed, remaining), (1, 1, 0));
                assert_eq!(current, "222");
            }
            other => panic!("expected bulk_progress, got {other:?}"),
        }
        match events.recv().await.unwrap() {
            DashboardEvent::BulkComplete { sent, failed, total } => {
                assert_eq!((sent, failed, total), (1, 1, 2));
            }
            other => panic!("expected bulk_complete, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn recipients_are_attempted_in_input_order() {
        let (transport, bulk, _db, _dir) = setup().await;

        bulk.run(request(&["333", "111", "222"], "ordered", 0))
            .await
            .unwrap();

        let sent = transport.sent_messages().await;
        let order: Vec<_> = sent.iter().map(|m| m.chat_id.as_str()).collect();
        assert_eq!(order, vec!["333@c.us", "111@c.us", "222@c.us"]);
    }

    #[tokio::test]
    async fn duplicates_are_sent_once_per_occurrence() {
        let (transport, bulk, _db, _dir) = setup().await;

        bulk.run(request(&["111", "111"], "twice", 0)).await.unwrap();
        assert_eq!(transport.sent_count().await, 2);
    }

    #[tokio::test]
    async fn one_failure_never_aborts_the_rest() {
        let (transport, bulk, db, _dir) = setup().await;
        transport.fail_sends_to("111@c.us").await;

        bulk.run(request(&["111", "222", "333"], "resilient", 0))
            .await
            .unwrap();

        // The two later recipients still went out.
        assert_eq!(transport.sent_count().await, 2);
        let stats = logs::log_stats(&db).await.unwrap();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.failed, 1);
    }

    #[tokio::test]
    async fn disconnected_link_records_every_recipient_as_failed() {
        let (transport, bulk, db, _dir) = setup().await;
        transport.set_status(waauto_core::ConnectionStatus::Disconnected);

        let mut events = bulk.bus.subscribe();
        bulk.run(request(&["111", "222"], "offline", 0)).await.unwrap();

        let stats = logs::log_stats(&db).await.unwrap();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.failed, 2);

        // Drain progress, check the summary.
        let mut last = events.recv().await.unwrap();
        while let Ok(event) = events.try_recv() {
            last = event;
        }
        assert_eq!(
            last,
            DashboardEvent::BulkComplete {
                sent: 0,
                failed: 2,
                total: 2
            }
        );
    }

    #[tokio::test]
    async fn media_file_is_removed_after_the_run() {
        let (_transport, bulk, _db, dir) = setup().await;

        let media_path = dir.path().join("upload.jpg");
        tokio::fs::write(&media_path, b"jpeg bytes").await.unwrap();

        let req = BulkRequest {
            phones: vec!["111".to_string()],
            message: "with media".to_string(),
            media: Some(MediaRef {
                path: media_path.clone(),
                mime_type: Some("image/jpeg".to_string()),
                filename: Some("upload.jpg".to_string()),
            }),
            delay_ms: 0,
        };
        bulk.run(req).await.unwrap();

        assert!(!media_path.exists(), "uploaded media must be cleaned up");
    }

    #[tokio::test]
    async fn resolve_delay_prefers_explicit_value() {
        let (_transport, bulk, db, _dir) = setup().await;

        assert_eq!(bulk.resolve_delay(Some(0)).await, 0);
        assert_eq!(bulk.resolve_delay(Some(1500)).await, 1500);

        // Absent and negative fall back to the stored setting (seeded 3000).
        assert_eq!(bulk.resolve_delay(None).await, 3000);
        assert_eq!(bulk.resolve_delay(Some(-1)).await, 3000);

        settings::set_setting(&db, "bulk_delay_ms", "500").await.unwrap();
        assert_eq!(bulk.resolve_delay(None).await, 500);

        // Garbled setting falls back to the compiled default.
        settings::set_setting(&db, "bulk_delay_ms", "soon").await.unwrap();
        assert_eq!(bulk.resolve_delay(None).await, 3000);
    }
}
