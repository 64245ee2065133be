// SPDX-FileCopyrightText: 2026 Waauto Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence layer for the waauto dashboard service.
//!
//! Provides WAL-mode SQLite storage with embedded migrations, a single-writer
//! concurrency model via `tokio-rusqlite`, and typed query operations for
//! auto-reply rules, scheduled messages, message logs, and settings.

pub mod database;
pub mod migrations;
pub mod models;
pub mod queries;

pub use database::{Database, now_timestamp};
pub use models::*;
