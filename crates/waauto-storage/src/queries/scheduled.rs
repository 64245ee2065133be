// SPDX-FileCopyrightText: 2026 Waauto Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scheduled message operations.
//!
//! Status transitions are guarded in SQL (`WHERE status = 'pending'`) so a
//! row moves pending -> {sent, failed} at most once, no matter how callers
//! interleave.

use rusqlite::params;
use waauto_core::WaautoError;

use crate::database::Database;
use crate::models::{ScheduledMessage, parse_enum};

fn row_to_scheduled(row: &rusqlite::Row<'_>) -> Result<ScheduledMessage, rusqlite::Error> {
    Ok(ScheduledMessage {
        id: row.get(0)?,
        phone: row.get(1)?,
        message: row.get(2)?,
        scheduled_at: row.get(3)?,
        status: parse_enum(4, row.get::<_, String>(4)?)?,
        sent_at: row.get(5)?,
        error: row.get(6)?,
        created_at: row.get(7)?,
    })
}

const SCHEDULED_COLUMNS: &str =
    "id, phone, message, scheduled_at, status, sent_at, error, created_at";

/// List every scheduled message, soonest-scheduled last (dashboard order).
pub async fn list_scheduled(db: &Database) -> Result<Vec<ScheduledMessage>, WaautoError> {
    db.connection()
        .call(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SCHEDULED_COLUMNS} FROM scheduled_messages ORDER BY scheduled_at DESC"
            ))?;
            let rows = stmt.query_map([], row_to_scheduled)?;
            let mut messages = Vec::new();
            for row in rows {
                messages.push(row?);
            }
            Ok(messages)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// List pending rows whose scheduled time has passed, oldest due first.
pub async fn list_due_pending(
    db: &Database,
    now: &str,
) -> Result<Vec<ScheduledMessage>, WaautoError> {
    let now = now.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SCHEDULED_COLUMNS} FROM scheduled_messages
                 WHERE status = 'pending' AND scheduled_at <= ?1
                 ORDER BY scheduled_at ASC"
            ))?;
            let rows = stmt.query_map(params![now], row_to_scheduled)?;
            let mut messages = Vec::new();
            for row in rows {
                messages.push(row?);
            }
            Ok(messages)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Insert a new pending message. Returns the auto-generated id.
pub async fn insert_scheduled(
    db: &Database,
    phone: &str,
    message: &str,
    scheduled_at: &str,
) -> Result<i64, WaautoError> {
    let phone = phone.to_string();
    let message = message.to_string();
    let scheduled_at = scheduled_at.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO scheduled_messages (phone, message, scheduled_at)
                 VALUES (?1, ?2, ?3)",
                params![phone, message, scheduled_at],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Claim a pending row as sent. Returns false when the row was already
/// terminal (or deleted), in which case nothing was written.
pub async fn mark_scheduled_sent(
    db: &Database,
    id: i64,
    sent_at: &str,
) -> Result<bool, WaautoError> {
    let sent_at = sent_at.to_string();
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE scheduled_messages SET status = 'sent', sent_at = ?1, error = NULL
                 WHERE id = ?2 AND status = 'pending'",
                params![sent_at, id],
            )?;
            Ok(changed > 0)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Claim a pending row as failed, recording the failure message. Returns
/// false when the row was already terminal (or deleted).
pub async fn mark_scheduled_failed(
    db: &Database,
    id: i64,
    error: &str,
) -> Result<bool, WaautoError> {
    let error = error.to_string();
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE scheduled_messages SET status = 'failed', error = ?1
                 WHERE id = ?2 AND status = 'pending'",
                params![error, id],
            )?;
            Ok(changed > 0)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Delete a scheduled message. Only pending rows are deletable; returns
/// false for terminal or unknown rows.
pub async fn delete_scheduled(db: &Database, id: i64) -> Result<bool, WaautoError> {
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "DELETE FROM scheduled_messages WHERE id = ?1 AND status = 'pending'",
                params![id],
            )?;
            Ok(changed > 0)
        })
        .await
        .map_err(crate::database::map_tr_err)
}
