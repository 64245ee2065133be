// SPDX-FileCopyrightText: 2026 Waauto Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the waauto dashboard service.
//!
//! This crate provides the foundational trait definitions, error types, and
//! common types used throughout the waauto workspace. The WhatsApp protocol
//! work itself lives behind the [`Transport`] trait; everything above it is
//! storage, matching, scheduling, and relay logic built on these types.

pub mod chat_id;
pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::WaautoError;
pub use traits::Transport;
pub use types::{
    AutoReplyRule, ClientInfo, ConnectionStatus, Direction, IncomingMessage, LogKind, LogStats,
    LogStatus, MatchMode, MediaRef, MessageLog, ScheduleStatus, ScheduledMessage, StatusSnapshot,
    TransportEvent,
};
