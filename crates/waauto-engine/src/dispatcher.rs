// SPDX-FileCopyrightText: 2026 Waauto Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The outbound dispatcher: one gate in front of the protocol client.
//!
//! The protocol client does not guarantee safe concurrent invocation, so the
//! scheduler, the bulk sender, and auto-replies all funnel through one
//! [`Dispatcher`] whose internal mutex serializes every send.

use std::sync::Arc;

use tokio::sync::Mutex;

use waauto_core::chat_id;
use waauto_core::error::WaautoError;
use waauto_core::traits::Transport;
use waauto_core::types::{ConnectionStatus, Direction, LogKind, LogStatus, MediaRef};
use waauto_storage::Database;
use waauto_storage::queries::logs;

/// Placeholder recorded in the log when a media message carries no caption.
pub(crate) const MEDIA_PLACEHOLDER: &str = "[media]";

/// Outcome of a successful dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendReceipt {
    /// The chat identifier the message was actually addressed to.
    pub chat_id: String,
    /// Content kind derived from media presence.
    pub kind: LogKind,
}

/// Translates a (phone, text, media) triple into a protocol-client send.
///
/// Logging contract: the dispatcher appends exactly one `sent` log row per
/// attempt that reaches the protocol layer and succeeds. Failed attempts are
/// returned as errors and recording them is the caller's responsibility; a
/// `NotConnected` refusal never reaches the protocol layer and produces no
/// row anywhere.
pub struct Dispatcher {
    transport: Arc<dyn Transport>,
    db: Database,
    send_lock: Mutex<()>,
}

impl Dispatcher {
    pub fn new(transport: Arc<dyn Transport>, db: Database) -> Self {
        Self {
            transport,
            db,
            send_lock: Mutex::new(()),
        }
    }

    /// Dispatch one message.
    ///
    /// Fails fast with [`WaautoError::NotConnected`] while the link is down.
    /// Never queued: a send must not wait silently on a link that may never
    /// come back without operator action.
    pub async fn send(
        &self,
        phone: &str,
        message: &str,
        media: Option<&MediaRef>,
    ) -> Result<SendReceipt, WaautoError> {
        if message.is_empty() && media.is_none() {
            return Err(WaautoError::Internal(
                "message may be empty only when media is attached".to_string(),
            ));
        }

        let chat_id = chat_id::from_phone(phone)?;

        if self.transport.status().status != ConnectionStatus::Connected {
            return Err(WaautoError::NotConnected);
        }

        let kind = if media.is_some() {
            LogKind::Media
        } else {
            LogKind::Text
        };

        {
            let _serialized = self.send_lock.lock().await;
            self.transport.send_message(&chat_id, message, media).await?;
        }

        let logged = if message.is_empty() {
            MEDIA_PLACEHOLDER
        } else {
            message
        };
        logs::append_log(&self.db, phone, logged, Direction::Sent, kind, LogStatus::Sent).await?;

        tracing::debug!(phone, kind = %kind, "message dispatched");
        Ok(SendReceipt { chat_id, kind })
    }
}
