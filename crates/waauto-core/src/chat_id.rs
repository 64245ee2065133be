// SPDX-FileCopyrightText: 2026 Waauto Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Phone number to chat-identifier normalization.
//!
//! The protocol client addresses individual chats as `<digits>@c.us` and
//! groups as `<id>@g.us`. Operator input arrives as free-form phone strings.

use crate::error::WaautoError;

/// Suffix for individual chats.
const USER_SUFFIX: &str = "@c.us";

/// Normalize a raw phone string into the client's chat-identifier format.
///
/// Input that already contains `@` is treated as a ready-made chat identifier
/// and passed through untouched, so group ids survive. Otherwise every
/// non-digit character is stripped and the `@c.us` suffix is appended.
pub fn from_phone(phone: &str) -> Result<String, WaautoError> {
    let trimmed = phone.trim();
    if trimmed.contains('@') {
        return Ok(trimmed.to_string());
    }

    let digits: String = trimmed.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return Err(WaautoError::Internal(format!(
            "phone number contains no digits: {phone:?}"
        )));
    }
    Ok(format!("{digits}{USER_SUFFIX}"))
}

/// Strip the individual-chat suffix for display and logging.
pub fn display_phone(chat_id: &str) -> &str {
    chat_id.strip_suffix(USER_SUFFIX).unwrap_or(chat_id)
}
