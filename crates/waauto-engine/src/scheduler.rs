// SPDX-FileCopyrightText: 2026 Waauto Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fixed-cadence polling loop for scheduled messages.
//!
//! Every tick queries the due pending set (oldest due first) and dispatches
//! each row sequentially. The tick body runs inline in the timer task, so
//! ticks never overlap. Failure is terminal: there is no retry of a failed
//! scheduled message.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use waauto_bus::{DashboardEvent, EventBus};
use waauto_core::error::WaautoError;
use waauto_core::types::ScheduleStatus;
use waauto_storage::queries::scheduled;
use waauto_storage::{Database, now_timestamp};

use crate::dispatcher::Dispatcher;

/// The scheduler loop. The only autonomous driver in the pipeline.
pub struct Scheduler {
    db: Database,
    dispatcher: Arc<Dispatcher>,
    bus: EventBus,
    tick: Duration,
}

impl Scheduler {
    pub fn new(db: Database, dispatcher: Arc<Dispatcher>, bus: EventBus, tick_secs: u64) -> Self {
        Self {
            db,
            dispatcher,
            bus,
            tick: Duration::from_secs(tick_secs),
        }
    }

    /// Spawn the polling loop. The first immediate interval tick is skipped
    /// so startup does not race the rest of the bring-up.
    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(self.tick);
            interval.tick().await;

            tracing::info!(tick_secs = self.tick.as_secs(), "scheduler started");
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        if let Err(e) = self.run_tick().await {
                            tracing::warn!(error = %e, "scheduler tick failed");
                        }
                    }
                    _ = cancel.cancelled() => {
                        tracing::info!("scheduler shutting down");
                        break;
                    }
                }
            }
        })
    }

    /// Process everything currently due. Public so tests can drive ticks
    /// without waiting on the timer.
    pub async fn run_tick(&self) -> Result<(), WaautoError> {
        let now = now_timestamp();
        let due = scheduled::list_due_pending(&self.db, &now).await?;

        for row in due {
            match self.dispatcher.send(&row.phone, &row.message, None).await {
                Ok(_) => {
                    let sent_at = now_timestamp();
                    let claimed = scheduled::mark_scheduled_sent(&self.db, row.id, &sent_at).await?;
                    if claimed {
                        tracing::info!(id = row.id, phone = %row.phone, "scheduled message sent");
                        self.bus.publish(DashboardEvent::ScheduledSent {
                            id: row.id,
                            phone: row.phone,
                            status: ScheduleStatus::Sent,
                            error: None,
                        });
                    }
                }
                Err(e) => {
                    let message = e.to_string();
                    let claimed =
                        scheduled::mark_scheduled_failed(&self.db, row.id, &message).await?;
                    if claimed {
                        tracing::warn!(id = row.id, phone = %row.phone, error = %message, "scheduled message failed");
                        self.bus.publish(DashboardEvent::ScheduledSent {
                            id: row.id,
                            phone: row.phone,
                            status: ScheduleStatus::Failed,
                            error: Some(message),
                        });
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use waauto_config::model::StorageConfig;
    use waauto_test_utils::MockTransport;

    async fn setup() -> (Arc<MockTransport>, Scheduler, Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let config = StorageConfig {
            database_path: dir.path().join("test.db").to_str().unwrap().to_string(),
            wal_mode: true,
        };
        let db = Database::open(&config).await.unwrap();
        let transport = Arc::new(MockTransport::connected());
        let dispatcher = Arc::new(Dispatcher::new(transport.clone(), db.clone()));
        let scheduler = Scheduler::new(db.clone(), dispatcher, EventBus::new(16), 30);
        (transport, scheduler, db, dir)
    }

    #[tokio::test]
    async fn due_pending_row_is_sent_with_timestamp() {
        let (transport, scheduler, db, _dir) = setup().await;

        let id = scheduled::insert_scheduled(&db, "555111", "on time", "2026-01-01T00:00:00.000Z")
            .await
            .unwrap();

        let mut events = scheduler.bus.subscribe();
        scheduler.run_tick().await.unwrap();

        assert_eq!(transport.sent_count().await, 1);
        let rows = scheduled::list_scheduled(&db).await.unwrap();
        assert_eq!(rows[0].status, ScheduleStatus::Sent);
        assert!(rows[0].sent_at.is_some());

        match events.recv().await.unwrap() {
            DashboardEvent::ScheduledSent { id: event_id, status, error, .. } => {
                assert_eq!(event_id, id);
                assert_eq!(status, ScheduleStatus::Sent);
                assert!(error.is_none());
            }
            other => panic!("expected scheduled_sent, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn future_rows_are_left_alone() {
        let (transport, scheduler, db, _dir) = setup().await;

        scheduled::insert_scheduled(&db, "555111", "later", "2099-01-01T00:00:00.000Z")
            .await
            .unwrap();
        scheduler.run_tick().await.unwrap();

        assert_eq!(transport.sent_count().await, 0);
        let rows = scheduled::list_scheduled(&db).await.unwrap();
        assert_eq!(rows[0].status, ScheduleStatus::Pending);
    }

    #[tokio::test]
    async fn failure_is_terminal_and_recorded() {
        let (transport, scheduler, db, _dir) = setup().await;
        transport.fail_sends_to("555111@c.us").await;

        scheduled::insert_scheduled(&db, "555111", "doomed", "2026-01-01T00:00:00.000Z")
            .await
            .unwrap();

        let mut events = scheduler.bus.subscribe();
        scheduler.run_tick().await.unwrap();

        let rows = scheduled::list_scheduled(&db).await.unwrap();
        assert_eq!(rows[0].status, ScheduleStatus::Failed);
        assert!(rows[0].error.as_deref().unwrap().contains("555111@c.us"));

        match events.recv().await.unwrap() {
            DashboardEvent::ScheduledSent { status, error, .. } => {
                assert_eq!(status, ScheduleStatus::Failed);
                assert!(error.is_some());
            }
            other => panic!("expected scheduled_sent, got {other:?}"),
        }

        // No retry: the next tick does not touch the failed row.
        scheduler.run_tick().await.unwrap();
        assert_eq!(transport.sent_count().await, 0);
    }

    #[tokio::test]
    async fn rerunning_a_tick_never_reprocesses_terminal_rows() {
        let (transport, scheduler, db, _dir) = setup().await;

        scheduled::insert_scheduled(&db, "555111", "once", "2026-01-01T00:00:00.000Z")
            .await
            .unwrap();

        scheduler.run_tick().await.unwrap();
        scheduler.run_tick().await.unwrap();
        scheduler.run_tick().await.unwrap();

        assert_eq!(transport.sent_count().await, 1, "row must be sent exactly once");
    }

    #[tokio::test]
    async fn due_rows_are_processed_oldest_first() {
        let (transport, scheduler, db, _dir) = setup().await;

        scheduled::insert_scheduled(&db, "222", "second", "2026-01-01T00:10:00.000Z")
            .await
            .unwrap();
        scheduled::insert_scheduled(&db, "111", "first", "2026-01-01T00:05:00.000Z")
            .await
            .unwrap();

        scheduler.run_tick().await.unwrap();

        let sent = transport.sent_messages().await;
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].body, "first");
        assert_eq!(sent[1].body, "second");
    }

    #[tokio::test]
    async fn disconnected_link_fails_rows_without_protocol_calls() {
        let (transport, scheduler, db, _dir) = setup().await;
        transport.set_status(waauto_core::ConnectionStatus::Disconnected);

        scheduled::insert_scheduled(&db, "555111", "offline", "2026-01-01T00:00:00.000Z")
            .await
            .unwrap();
        scheduler.run_tick().await.unwrap();

        assert_eq!(transport.sent_count().await, 0);
        let rows = scheduled::list_scheduled(&db).await.unwrap();
        assert_eq!(rows[0].status, ScheduleStatus::Failed);
    }
}
