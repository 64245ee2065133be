// SPDX-FileCopyrightText: 2026 Waauto Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Auto-reply rule CRUD operations.

use rusqlite::params;
use waauto_core::WaautoError;

use crate::database::Database;
use crate::models::{AutoReplyRule, MatchMode, parse_enum};

fn row_to_rule(row: &rusqlite::Row<'_>) -> Result<AutoReplyRule, rusqlite::Error> {
    Ok(AutoReplyRule {
        id: row.get(0)?,
        keyword: row.get(1)?,
        reply: row.get(2)?,
        match_mode: parse_enum(3, row.get::<_, String>(3)?)?,
        enabled: row.get::<_, i64>(4)? != 0,
        created_at: row.get(5)?,
    })
}

const RULE_COLUMNS: &str = "id, keyword, reply, match_mode, enabled, created_at";

/// List every rule, most-recently-created first (dashboard listing order).
pub async fn list_rules(db: &Database) -> Result<Vec<AutoReplyRule>, WaautoError> {
    db.connection()
        .call(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {RULE_COLUMNS} FROM auto_replies ORDER BY id DESC"
            ))?;
            let rows = stmt.query_map([], row_to_rule)?;
            let mut rules = Vec::new();
            for row in rows {
                rules.push(row?);
            }
            Ok(rules)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// List enabled rules in the matcher's scan order (most-recently-created
/// first, same as the listing so "first match wins" is what the operator sees).
pub async fn list_enabled_rules(db: &Database) -> Result<Vec<AutoReplyRule>, WaautoError> {
    db.connection()
        .call(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {RULE_COLUMNS} FROM auto_replies WHERE enabled = 1 ORDER BY id DESC"
            ))?;
            let rows = stmt.query_map([], row_to_rule)?;
            let mut rules = Vec::new();
            for row in rows {
                rules.push(row?);
            }
            Ok(rules)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Get a rule by id.
pub async fn get_rule(db: &Database, id: i64) -> Result<Option<AutoReplyRule>, WaautoError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {RULE_COLUMNS} FROM auto_replies WHERE id = ?1"
            ))?;
            match stmt.query_row(params![id], row_to_rule) {
                Ok(rule) => Ok(Some(rule)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Insert a new rule. Returns the auto-generated rule id.
pub async fn insert_rule(
    db: &Database,
    keyword: &str,
    reply: &str,
    match_mode: MatchMode,
    enabled: bool,
) -> Result<i64, WaautoError> {
    let keyword = keyword.to_string();
    let reply = reply.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO auto_replies (keyword, reply, match_mode, enabled)
                 VALUES (?1, ?2, ?3, ?4)",
                params![keyword, reply, match_mode.to_string(), enabled as i64],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Replace every mutable field of a rule. Returns false when the id is unknown.
pub async fn update_rule(
    db: &Database,
    id: i64,
    keyword: &str,
    reply: &str,
    match_mode: MatchMode,
    enabled: bool,
) -> Result<bool, WaautoError> {
    let keyword = keyword.to_string();
    let reply = reply.to_string();
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE auto_replies SET keyword = ?1, reply = ?2, match_mode = ?3, enabled = ?4
                 WHERE id = ?5",
                params![keyword, reply, match_mode.to_string(), enabled as i64, id],
            )?;
            Ok(changed > 0)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Delete a rule. Returns false when the id is unknown.
pub async fn delete_rule(db: &Database, id: i64) -> Result<bool, WaautoError> {
    db.connection()
        .call(move |conn| {
            let changed = conn.execute("DELETE FROM auto_replies WHERE id = ?1", params![id])?;
            Ok(changed > 0)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Flip a single rule on or off. Returns false when the id is unknown.
pub async fn set_rule_enabled(db: &Database, id: i64, enabled: bool) -> Result<bool, WaautoError> {
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE auto_replies SET enabled = ?1 WHERE id = ?2",
                params![enabled as i64, id],
            )?;
            Ok(changed > 0)
        })
        .await
        .map_err(crate::database::map_tr_err)
}
