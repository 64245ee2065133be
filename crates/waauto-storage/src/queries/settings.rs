// SPDX-FileCopyrightText: 2026 Waauto Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Key/value settings operations.

use rusqlite::params;
use waauto_core::WaautoError;

use crate::database::Database;

/// Get a setting value, `None` when the key was never set.
pub async fn get_setting(db: &Database, key: &str) -> Result<Option<String>, WaautoError> {
    let key = key.to_string();
    db.connection()
        .call(move |conn| {
            let result = conn.query_row(
                "SELECT value FROM bot_settings WHERE key = ?1",
                params![key],
                |row| row.get(0),
            );
            match result {
                Ok(value) => Ok(Some(value)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Upsert a setting value.
pub async fn set_setting(db: &Database, key: &str, value: &str) -> Result<(), WaautoError> {
    let key = key.to_string();
    let value = value.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT OR REPLACE INTO bot_settings (key, value) VALUES (?1, ?2)",
                params![key, value],
            )?;
            Ok(())
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
    async fn get_missing_key_returns_none() {
        let (db, _dir) = setup_db().await;
        assert!(get_setting(&db, "no-such-key").await.unwrap().is_none());
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn set_then_get_round_trips() {
        let (db, _dir) = setup_db().await;

        set_setting(&db, "bulk_delay_ms", "5000").await.unwrap();
        assert_eq!(
            get_setting(&db, "bulk_delay_ms").await.unwrap().as_deref(),
            Some("5000")
        );

        // Upsert replaces.
        set_setting(&db, "bulk_delay_ms", "250").await.unwrap();
        assert_eq!(
            get_setting(&db, "bulk_delay_ms").await.unwrap().as_deref(),
            Some("250")
        );

        db.close().await.unwrap();
    }
}
