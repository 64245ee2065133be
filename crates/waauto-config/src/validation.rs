// SPDX-FileCopyrightText: 2026 Waauto Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for values Figment cannot check.

use waauto_core::WaautoError;

use crate::model::WaautoConfig;

/// Validate constraints that hold across fields.
pub fn validate_config(config: &WaautoConfig) -> Result<(), WaautoError> {
    if config.storage.database_path.trim().is_empty() {
        return Err(WaautoError::Config(
            "storage.database_path must not be empty".to_string(),
        ));
    }

    if config.scheduler.tick_secs == 0 {
        return Err(WaautoError::Config(
            "scheduler.tick_secs must be at least 1".to_string(),
        ));
    }

    if !config.bridge.url.starts_with("http://") && !config.bridge.url.starts_with("https://") {
        return Err(WaautoError::Config(format!(
            "bridge.url must be an http(s) URL, got {:?}",
            config.bridge.url
        )));
    }

    if let Some(token) = &config.server.bearer_token {
        if token.trim().is_empty() {
            return Err(WaautoError::Config(
                "server.bearer_token must not be empty when set".to_string(),
            ));
        }
    }

    Ok(())
}
