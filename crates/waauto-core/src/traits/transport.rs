// SPDX-FileCopyrightText: 2026 Waauto Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The seam to the WhatsApp protocol client.
//!
//! Session crypto, multi-device pairing, and message framing all live behind
//! this trait. waauto only ever observes the connection snapshot, pushes
//! outbound sends, and consumes lifecycle/message events.

use async_trait::async_trait;

use crate::error::WaautoError;
use crate::types::{MediaRef, StatusSnapshot, TransportEvent};

/// Opaque capability exposed by the WhatsApp protocol client.
///
/// Implementations do not guarantee safe concurrent invocation of
/// [`send_message`](Transport::send_message); callers must serialize sends
/// through a single writer (the dispatcher does).
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Establish the link to the protocol client and start delivering events.
    async fn connect(&self) -> Result<(), WaautoError>;

    /// Last-known connection snapshot. Cheap; callable from any task.
    fn status(&self) -> StatusSnapshot;

    /// Hand one message to the protocol client for delivery.
    ///
    /// `chat_id` must already be in the client's chat-identifier format
    /// (see [`crate::chat_id::from_phone`]).
    async fn send_message(
        &self,
        chat_id: &str,
        body: &str,
        media: Option<&MediaRef>,
    ) -> Result<(), WaautoError>;

    /// Receive the next lifecycle or message event.
    async fn receive(&self) -> Result<TransportEvent, WaautoError>;

    /// Tear down the session so the next connect starts a fresh pairing.
    async fn logout(&self) -> Result<(), WaautoError>;
}
