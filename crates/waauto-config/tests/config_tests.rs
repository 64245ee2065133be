// SPDX-FileCopyrightText: 2026 Waauto Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the waauto configuration system.

use waauto_config::model::WaautoConfig;
use waauto_config::{load_and_validate_str, load_config_from_str};

/// Valid TOML with all known fields deserializes successfully.
#[test]
fn valid_toml_deserializes_into_waauto_config() {
    let toml = r#"
[daemon]
log_level = "debug"

[server]
host = "0.0.0.0"
port = 8080
bearer_token = "operator-token"
upload_dir = "/tmp/uploads"

[storage]
database_path = "/tmp/test.db"
wal_mode = false

[bridge]
url = "http://127.0.0.1:4001"
callback_host = "127.0.0.1"
callback_port = 4002
webhook_secret = "hook-secret"

[scheduler]
tick_secs = 10
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.daemon.log_level, "debug");
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.server.port, 8080);
    assert_eq!(config.server.bearer_token.as_deref(), Some("operator-token"));
    assert_eq!(config.server.upload_dir, "/tmp/uploads");
    assert_eq!(config.storage.database_path, "/tmp/test.db");
    assert!(!config.storage.wal_mode);
    assert_eq!(config.bridge.url, "http://127.0.0.1:4001");
    assert_eq!(config.bridge.callback_port, 4002);
    assert_eq!(config.bridge.webhook_secret.as_deref(), Some("hook-secret"));
    assert_eq!(config.scheduler.tick_secs, 10);
}

/// Missing sections fall back to defaults without error.
#[test]
fn missing_sections_use_defaults() {
    let config = load_config_from_str("").expect("empty TOML should use defaults");

    assert_eq!(config.daemon.log_level, "info");
    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.server.port, 3000);
    assert!(config.server.bearer_token.is_none());
    assert!(config.storage.database_path.ends_with("waauto.db"));
    assert!(config.storage.wal_mode);
    assert_eq!(config.bridge.url, "http://127.0.0.1:3001");
    assert_eq!(config.bridge.callback_port, 3002);
    assert!(config.bridge.webhook_secret.is_none());
    assert_eq!(config.scheduler.tick_secs, 30);
}

/// Unknown fields are rejected rather than silently ignored.
#[test]
fn unknown_field_produces_error() {
    let toml = r#"
[server]
prot = 8080
"#;

    let err = load_config_from_str(toml).expect_err("should reject unknown field");
    let err_str = format!("{err}");
    assert!(
        err_str.contains("unknown field") || err_str.contains("prot"),
        "error should mention the unknown key, got: {err_str}"
    );
}

/// Dot-notation overrides (as produced by the env provider) win over TOML.
#[test]
fn override_wins_over_toml() {
    use figment::{
        Figment,
        providers::{Format, Serialized, Toml},
    };

    let toml_content = r#"
[server]
port = 3000
"#;

    let config: WaautoConfig = Figment::new()
        .merge(Serialized::defaults(WaautoConfig::default()))
        .merge(Toml::string(toml_content))
        .merge(("server.port", 9999))
        .extract()
        .expect("should merge override");

    assert_eq!(config.server.port, 9999);
}

/// `bridge.webhook_secret` maps as one key, not `bridge.webhook.secret`.
#[test]
fn underscore_keys_survive_dot_mapping() {
    use figment::{Figment, providers::Serialized};

    let config: WaautoConfig = Figment::new()
        .merge(Serialized::defaults(WaautoConfig::default()))
        .merge(("bridge.webhook_secret", "from-env"))
        .extract()
        .expect("should set webhook_secret via dot notation");

    assert_eq!(config.bridge.webhook_secret.as_deref(), Some("from-env"));
}

/// Validation runs on the loaded result.
#[test]
fn validation_rejects_bad_scheduler_tick() {
    let toml = r#"
[scheduler]
tick_secs = 0
"#;
    assert!(load_and_validate_str(toml).is_err());
}
