// SPDX-FileCopyrightText: 2026 Waauto Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the waauto dashboard service.

use thiserror::Error;

/// The primary error type used across all waauto crates.
#[derive(Debug, Error)]
pub enum WaautoError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database open, query failure, migration failure).
    ///
    /// No operation has a safe degraded mode without durable state, so these
    /// propagate to the caller as hard errors.
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Dispatch was attempted while the WhatsApp link is not in the connected
    /// state. Fatal to that one attempt, never retried and never queued.
    #[error("whatsapp client is not connected")]
    NotConnected,

    /// The protocol layer rejected a send. Recorded by the caller as a failed
    /// outcome, not retried.
    #[error("send failed: {message}")]
    Send {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Transport plumbing errors that are not a rejected send (webhook listener
    /// bind failure, malformed bridge payload, event channel closed).
    #[error("channel error: {message}")]
    Channel {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}
