// SPDX-FileCopyrightText: 2026 Waauto Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All writes are serialized through tokio-rusqlite's single background
//! thread. The `Database` struct IS the single writer: query modules accept
//! `&Database` and call through `connection().call()`. Do NOT open additional
//! connections for writes.

use std::path::Path;

use waauto_config::model::StorageConfig;
use waauto_core::WaautoError;

/// Handle to the single SQLite connection.
///
/// Cloning is cheap and shares the same underlying connection thread.
#[derive(Clone)]
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl Database {
    /// Open (creating if necessary) the database at the configured path,
    /// apply PRAGMAs, and run all pending migrations.
    pub async fn open(config: &StorageConfig) -> Result<Self, WaautoError> {
        if let Some(parent) = Path::new(&config.database_path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| WaautoError::Storage {
                    source: Box::new(e),
                })?;
            }
        }

        let conn = tokio_rusqlite::Connection::open(&config.database_path)
            .await
            .map_err(map_tr_err)?;

        let wal_mode = config.wal_mode;
        conn.call(move |conn| {
            let mut pragmas = String::new();
            if wal_mode {
                pragmas.push_str("PRAGMA journal_mode=WAL;");
            }
            pragmas.push_str(
                "PRAGMA synchronous=NORMAL;
                 PRAGMA foreign_keys=ON;
                 PRAGMA busy_timeout=5000;",
            );
            conn.execute_batch(&pragmas)?;

            crate::migrations::run_migrations(conn)
                .map_err(|e| tokio_rusqlite::Error::Other(e.into()))?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;

        tracing::debug!(path = %config.database_path, "database opened");
        Ok(Self { conn })
    }

    /// The underlying tokio-rusqlite connection.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Checkpoint the WAL and close the connection.
    pub async fn close(&self) -> Result<(), WaautoError> {
        self.conn
            .call(|conn| {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        tracing::debug!("WAL checkpoint complete");
        Ok(())
    }
}

/// Convert a tokio-rusqlite error into the crate-wide storage error.
pub(crate) fn map_tr_err(e: tokio_rusqlite::Error) -> WaautoError {
    WaautoError::Storage {
        source: Box::new(e),
    }
}

/// Current UTC time in the canonical column format.
///
/// Matches the schema's `strftime('%Y-%m-%dT%H:%M:%fZ', 'now')` default so
/// lexicographic comparison of timestamp columns equals chronological order.
pub fn now_timestamp() -> String {
    chrono::Utc::now()
        .format("%Y-%m-%dT%H:%M:%S%.3fZ")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn make_config(path: &str) -> StorageConfig {
        StorageConfig {
            database_path: path.to_string(),
            wal_mode: true,
        }
    }

    #[tokio::test]
    async fn open_creates_database_and_parent_dirs() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("nested").join("test.db");
        let db = Database::open(&make_config(db_path.to_str().unwrap()))
            .await
            .unwrap();
        assert!(db_path.exists(), "database file should be created");
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn open_is_idempotent_across_restarts() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("restart.db");
        let config = make_config(db_path.to_str().unwrap());

        let db = Database::open(&config).await.unwrap();
        db.close().await.unwrap();

        // Re-open: migrations must not fail on an already-migrated file.
        let db = Database::open(&config).await.unwrap();
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn settings_are_seeded() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("seeded.db");
        let db = Database::open(&make_config(db_path.to_str().unwrap()))
            .await
            .unwrap();

        let value = crate::queries::settings::get_setting(&db, "bulk_delay_ms")
            .await
            .unwrap();
        assert_eq!(value.as_deref(), Some("3000"));

        let value = crate::queries::settings::get_setting(&db, "auto_reply_enabled")
            .await
            .unwrap();
        assert_eq!(value.as_deref(), Some("1"));
    }

    #[test]
    fn now_timestamp_matches_column_format() {
        let ts = now_timestamp();
        // e.g. 2026-08-07T12:30:05.123Z
        assert_eq!(ts.len(), 24);
        assert!(ts.ends_with('Z'));
        assert_eq!(&ts[4..5], "-");
        assert_eq!(&ts[10..11], "T");
        assert_eq!(&ts[19..20], ".");
    }
}
