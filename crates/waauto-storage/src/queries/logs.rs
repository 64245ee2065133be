// SPDX-FileCopyrightText: 2026 Waauto Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message log operations.
//!
//! The log is append-only: no update or delete operations exist in this
//! module.

use rusqlite::params;
use waauto_core::WaautoError;

use crate::database::Database;
use crate::models::{Direction, LogKind, LogStats, LogStatus, MessageLog, parse_enum};

fn row_to_log(row: &rusqlite::Row<'_>) -> Result<MessageLog, rusqlite::Error> {
    Ok(MessageLog {
        id: row.get(0)?,
        phone: row.get(1)?,
        message: row.get(2)?,
        direction: parse_enum(3, row.get::<_, String>(3)?)?,
        kind: parse_enum(4, row.get::<_, String>(4)?)?,
        status: parse_enum(5, row.get::<_, String>(5)?)?,
        created_at: row.get(6)?,
    })
}

/// Append one log row. Returns the auto-generated id.
pub async fn append_log(
    db: &Database,
    phone: &str,
    message: &str,
    direction: Direction,
    kind: LogKind,
    status: LogStatus,
) -> Result<i64, WaautoError> {
    let phone = phone.to_string();
    let message = message.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO message_logs (phone, message, direction, kind, status)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    phone,
                    message,
                    direction.to_string(),
                    kind.to_string(),
                    status.to_string(),
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// List the most recent log rows, newest first.
pub async fn list_logs(db: &Database, limit: i64) -> Result<Vec<MessageLog>, WaautoError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, phone, message, direction, kind, status, created_at
                 FROM message_logs ORDER BY id DESC LIMIT ?1",
            )?;
            let rows = stmt.query_map(params![limit], row_to_log)?;
            let mut logs = Vec::new();
            for row in rows {
                logs.push(row?);
            }
            Ok(logs)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Aggregate counters over the whole log.
pub async fn log_stats(db: &Database) -> Result<LogStats, WaautoError> {
    db.connection()
        .call(|conn| {
            let stats = conn.query_row(
                "SELECT
                    COUNT(*),
                    COALESCE(SUM(CASE WHEN direction = 'sent' THEN 1 ELSE 0 END), 0),
                    COALESCE(SUM(CASE WHEN direction = 'received' THEN 1 ELSE 0 END), 0),
                    COALESCE(SUM(CASE WHEN status = 'failed' THEN 1 ELSE 0 END), 0)
                 FROM message_logs",
                [],
                |row| {
                    Ok(LogStats {
                        total: row.get(0)?,
                        sent: row.get(1)?,
                        received: row.get(2)?,
                        failed: row.get(3)?,
                    })
                },
            )?;
            Ok(stats)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use waauto_config::model::StorageConfig;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let config = StorageConfig {
            database_path: db_path.to_str().unwrap().to_string(),
            wal_mode: true,
        };
        let db = Database::open(&config).await.unwrap();
        (db, dir)
    }

    #[tokio::test]
    async fn append_and_list_newest_first() {
        let (db, _dir) = setup_db().await;

        append_log(&db, "111", "hello", Direction::Sent, LogKind::Text, LogStatus::Sent)
            .await
            .unwrap();
        append_log(&db, "222", "hi back", Direction::Received, LogKind::Text, LogStatus::Received)
            .await
            .unwrap();

        let logs = list_logs(&db, 100).await.unwrap();
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0].phone, "222");
        assert_eq!(logs[0].direction, Direction::Received);
        assert_eq!(logs[1].phone, "111");
        assert_eq!(logs[1].status, LogStatus::Sent);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn list_respects_limit() {
        let (db, _dir) = setup_db().await;

        for i in 0..5 {
            append_log(
                &db,
                &format!("{i}"),
                "msg",
                Direction::Sent,
                LogKind::Text,
                LogStatus::Sent,
            )
            .await
            .unwrap();
        }

        let logs = list_logs(&db, 3).await.unwrap();
        assert_eq!(logs.len(), 3);
        assert_eq!(logs[0].phone, "4");

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn stats_count_directions_and_failures() {
        let (db, _dir) = setup_db().await;

        append_log(&db, "111", "a", Direction::Sent, LogKind::Text, LogStatus::Sent)
            .await
            .unwrap();
        append_log(&db, "222", "b", Direction::Sent, LogKind::Media, LogStatus::Failed)
            .await
            .unwrap();
        append_log(&db, "333", "c", Direction::Received, LogKind::Text, LogStatus::Received)
            .await
            .unwrap();

        let stats = log_stats(&db).await.unwrap();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.sent, 2);
        assert_eq!(stats.received, 1);
        assert_eq!(stats.failed, 1);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn stats_on_empty_log_are_zero() {
        let (db, _dir) = setup_db().await;
        let stats = log_stats(&db).await.unwrap();
        assert_eq!(stats, LogStats::default());
        db.close().await.unwrap();
    }
}
