// SPDX-FileCopyrightText: 2026 Waauto Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./waauto.toml` > `~/.config/waauto/waauto.toml` >
//! `/etc/waauto/waauto.toml` with environment variable overrides via the
//! `WAAUTO_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::WaautoConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/waauto/waauto.toml` (system-wide)
/// 3. `~/.config/waauto/waauto.toml` (user XDG config)
/// 4. `./waauto.toml` (local directory)
/// 5. `WAAUTO_*` environment variables
pub fn load_config() -> Result<WaautoConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(WaautoConfig::default()))
        .merge(Toml::file("/etc/waauto/waauto.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("waauto/waauto.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("waauto.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env vars).
///
/// Used for testing and explicit config specification.
pub fn load_config_from_str(toml_content: &str) -> Result<WaautoConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(WaautoConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<WaautoConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(WaautoConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names: `WAAUTO_BRIDGE_WEBHOOK_SECRET` must map
/// to `bridge.webhook_secret`, not `bridge.webhook.secret`.
fn env_provider() -> Env {
    Env::prefixed("WAAUTO_").map(|key| {
        // `key` is the lowercased env var name with the prefix stripped.
        // Example: WAAUTO_SERVER_BEARER_TOKEN -> "server_bearer_token"
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("daemon_", "daemon.", 1)
            .replacen("server_", "server.", 1)
            .replacen("storage_", "storage.", 1)
            .replacen("bridge_", "bridge.", 1)
            .replacen("scheduler_", "scheduler.", 1);
        mapped.into()
    })
}
