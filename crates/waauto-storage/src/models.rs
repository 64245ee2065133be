// SPDX-FileCopyrightText: 2026 Waauto Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain model types for storage entities.
//!
//! The canonical types are defined in `waauto-core::types` so the engine and
//! the gateway can use them without depending on this crate. This module
//! re-exports them for convenience within the storage crate.

use std::str::FromStr;

pub use waauto_core::types::{
    AutoReplyRule, Direction, LogKind, LogStats, LogStatus, MatchMode, MessageLog, ScheduleStatus,
    ScheduledMessage,
};

/// Parse a TEXT column into one of the strum-backed enums, mapping parse
/// failures onto rusqlite's conversion error so they surface as query errors.
pub(crate) fn parse_enum<T: FromStr>(idx: usize, value: String) -> Result<T, rusqlite::Error>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value.parse().map_err(|e: T::Err| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}
