// SPDX-FileCopyrightText: 2026 Waauto Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across the waauto workspace.
//!
//! Durable row types live here (rather than in the storage crate) so the
//! engine and the gateway can share them across the trait boundary without
//! depending on the storage implementation.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

// --- Connection state ---

/// State of the link to the WhatsApp protocol client.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize, Default,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    /// No usable link. Dispatch fails immediately in this state.
    #[default]
    Disconnected,
    /// The client is waiting for the operator to scan a pairing QR code.
    Qr,
    /// The link is up and sends are accepted.
    Connected,
}

/// Identity of the paired WhatsApp account, as reported by the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientInfo {
    pub pushname: String,
    pub phone: String,
    pub platform: String,
}

/// Last-known connection snapshot, pushed to the dashboard on every change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct StatusSnapshot {
    pub status: ConnectionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub info: Option<ClientInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// --- Durable row enums ---

/// How an auto-reply keyword is matched against inbound text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    Contains,
    Exact,
}

/// Lifecycle of a scheduled message. Transitions pending -> {sent, failed}
/// exactly once; both outcomes are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ScheduleStatus {
    Pending,
    Sent,
    Failed,
}

/// Direction of a logged message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Sent,
    Received,
}

/// Content kind of a logged message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum LogKind {
    Text,
    Media,
}

/// Outcome recorded in the message log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum LogStatus {
    Sent,
    Failed,
    Received,
}

// --- Durable rows ---

/// A keyword-triggered auto-reply rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoReplyRule {
    pub id: i64,
    pub keyword: String,
    pub reply: String,
    pub match_mode: MatchMode,
    pub enabled: bool,
    pub created_at: String,
}

/// A message scheduled for future dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledMessage {
    pub id: i64,
    pub phone: String,
    pub message: String,
    pub scheduled_at: String,
    pub status: ScheduleStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sent_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: String,
}

/// One append-only message log row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageLog {
    pub id: i64,
    pub phone: String,
    pub message: String,
    pub direction: Direction,
    /// Wire name is `type`, which is reserved in Rust.
    #[serde(rename = "type")]
    pub kind: LogKind,
    pub status: LogStatus,
    pub created_at: String,
}

/// Aggregate counters over the message log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct LogStats {
    pub total: i64,
    pub sent: i64,
    pub received: i64,
    pub failed: i64,
}

// --- Transport types ---

/// A media attachment referenced by its uploaded file on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaRef {
    pub path: PathBuf,
    pub mime_type: Option<String>,
    pub filename: Option<String>,
}

/// An inbound message delivered by the protocol client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    /// Sender chat identifier (e.g. `15551234567@c.us`).
    pub from: String,
    pub body: String,
    pub has_media: bool,
    /// Unix timestamp reported by the client.
    pub timestamp: i64,
}

/// Lifecycle and message events emitted by a [`crate::Transport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// A pairing QR code, already rendered as a data URL for the dashboard.
    Qr(String),
    /// The client finished pairing and is ready to send.
    Ready(ClientInfo),
    /// Session credentials were accepted.
    Authenticated,
    /// Session credentials were rejected.
    AuthFailure(String),
    /// The link dropped.
    Disconnected(String),
    /// An inbound message arrived.
    Message(IncomingMessage),
}
