// SPDX-FileCopyrightText: 2026 Lectern Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Lectern configuration system.

use lectern_config::diagnostic::{suggest_key, ConfigError};
use lectern_config::model::LecternConfig;
use lectern_config::{load_and_validate_str, load_config_from_path, load_config_from_str};
use serial_test::serial;

/// Valid TOML with all known fields deserializes successfully.
#[test]
fn valid_toml_deserializes_into_lectern_config() {
    let toml = r#"
[server]
host = "0.0.0.0"
port = 8080
app_url = "https://courses.example.com"
cors_origins = ["https://courses.example.com"]
log_level = "debug"

[storage]
database_path = "/tmp/test.db"
wal_mode = false

[auth]
jwt_secret = "jwt-secret"
token_ttl_secs = 1800

[payments]
api_key = "sk_test_123"
webhook_secret = "whsec_123"
currency = "eur"

[video]
token_id = "mux-id"
token_secret = "mux-secret"
signing_key_id = "kid-1"
signing_key_private = "LS0tLS1CRUdJTg=="

[object_storage]
access_key_id = "AKIDEXAMPLE"
secret_access_key = "secret"
region = "eu-west-1"
bucket = "course-materials"
endpoint = "http://localhost:9000"
path_style = true

[access]
max_video_ttl_secs = 7200
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.server.port, 8080);
    assert_eq!(config.server.app_url, "https://courses.example.com");
    assert_eq!(config.server.log_level, "debug");
    assert_eq!(config.storage.database_path, "/tmp/test.db");
    assert!(!config.storage.wal_mode);
    assert_eq!(config.auth.jwt_secret.as_deref(), Some("jwt-secret"));
    assert_eq!(config.auth.token_ttl_secs, 1800);
    assert_eq!(config.payments.currency, "eur");
    assert_eq!(config.payments.api_base, "https://api.stripe.com");
    assert!(config.video.signed_playback());
    assert_eq!(config.object_storage.bucket.as_deref(), Some("course-materials"));
    assert!(config.object_storage.path_style);
    assert_eq!(config.access.max_video_ttl_secs, 7200);
    assert_eq!(config.access.max_storage_ttl_secs, 600);
}

/// Unknown field in [payments] section produces an UnknownField error.
#[test]
fn unknown_field_in_payments_produces_error() {
    let toml = r#"
[payments]
webhok_secret = "whsec"
"#;

    let err = load_config_from_str(toml).expect_err("should reject unknown field");
    let err_str = format!("{err}");
    assert!(
        err_str.contains("unknown field") || err_str.contains("webhok_secret"),
        "error should mention unknown field or the bad key, got: {err_str}"
    );
}

/// Missing sections fall back to compiled defaults.
#[test]
fn missing_optional_sections_use_defaults() {
    let toml = r#"
[server]
port = 9000
"#;

    let config = load_config_from_str(toml).expect("partial config should load");
    assert_eq!(config.server.port, 9000);
    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.auth.token_ttl_secs, 3600);
    assert_eq!(config.access.live_join_ttl_secs, 600);
    assert_eq!(config.video.ingest_url, "rtmps://global-live.mux.com:443/app");
}

/// `LECTERN_PAYMENTS_WEBHOOK_SECRET` maps to `payments.webhook_secret`,
/// not `payments.webhook.secret`.
#[test]
#[serial]
fn env_var_overrides_file_value() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("lectern.toml");
    std::fs::write(&path, "[payments]\nwebhook_secret = \"from-file\"\n").expect("write");

    // SAFETY: test-only env mutation, serialized with #[serial].
    unsafe { std::env::set_var("LECTERN_PAYMENTS_WEBHOOK_SECRET", "from-env") };
    unsafe { std::env::set_var("LECTERN_OBJECT_STORAGE_BUCKET", "env-bucket") };
    let result = load_config_from_path(&path);
    unsafe { std::env::remove_var("LECTERN_PAYMENTS_WEBHOOK_SECRET") };
    unsafe { std::env::remove_var("LECTERN_OBJECT_STORAGE_BUCKET") };

    let config = result.expect("env override should load");
    assert_eq!(config.payments.webhook_secret.as_deref(), Some("from-env"));
    assert_eq!(config.object_storage.bucket.as_deref(), Some("env-bucket"));
}

/// A secret supplied only through the environment loads without any file.
#[test]
#[serial]
fn env_secret_without_config_file() {
    let dir = tempfile::tempdir().expect("tempdir");

    // SAFETY: test-only env mutation, serialized with #[serial].
    unsafe { std::env::set_var("LECTERN_AUTH_JWT_SECRET", "s3cret") };
    let result = load_config_from_path(&dir.path().join("absent.toml"));
    unsafe { std::env::remove_var("LECTERN_AUTH_JWT_SECRET") };

    let config = result.expect("env-only secret should load");
    assert_eq!(config.auth.jwt_secret.as_deref(), Some("s3cret"));
}

/// Missing config files are silently skipped (Figment's Toml::file() behavior).
#[test]
#[serial]
fn missing_config_file_is_skipped() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = load_config_from_path(&dir.path().join("absent.toml"))
        .expect("absent file should fall back to defaults");
    assert_eq!(config.server.port, 4000);
}

/// Top-level unknown sections are rejected too.
#[test]
fn deny_unknown_fields_at_top_level() {
    let toml = r#"
[billing]
enabled = true
"#;

    let result = load_config_from_str(toml);
    assert!(result.is_err(), "unknown top-level section should be rejected");
}

#[test]
fn diagnostic_suggestion_for_section_key() {
    let suggestion = suggest_key("signing_key_privat", &["signing_key_id", "signing_key_private"]);
    assert_eq!(suggestion.as_deref(), Some("signing_key_private"));
}

/// Error output from load_and_validate_str includes the key and a suggestion.
#[test]
fn diagnostic_error_includes_unknown_key() {
    let toml = r#"
[auth]
jwt_secert = "x"
"#;

    let errors = load_and_validate_str(toml).expect_err("should produce errors");
    let has_unknown_key = errors.iter().any(|e| {
        matches!(e, ConfigError::UnknownKey { key, suggestion, valid_keys, .. } if {
            key == "auth.jwt_secert"
                && suggestion.as_deref() == Some("jwt_secret")
                && valid_keys.contains("token_ttl_secs")
        })
    });
    assert!(
        has_unknown_key,
        "should have UnknownKey error for 'jwt_secert', got: {errors:?}"
    );
}

/// A misspelled section is reported at the top level with a suggestion.
#[test]
fn diagnostic_unknown_section_suggests_table() {
    let toml = r#"
[paymnets]
api_key = "sk"
"#;

    let errors = load_and_validate_str(toml).expect_err("unknown section should fail");
    assert!(
        errors.iter().any(|e| matches!(
            e,
            ConfigError::UnknownKey { key, suggestion, .. }
                if key == "paymnets" && suggestion.as_deref() == Some("payments")
        )),
        "got: {errors:?}"
    );
}

/// Invalid type (string where number expected) produces clear message.
#[test]
fn diagnostic_invalid_type_message() {
    let toml = r#"
[server]
port = "eighty"
"#;

    let errors = load_and_validate_str(toml).expect_err("should reject invalid type");
    assert!(
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::InvalidType { key, .. } if key == "server.port")),
        "should report an invalid type for server.port, got: {errors:?}"
    );
}

/// ConfigError can be rendered using miette's graphical handler.
#[test]
fn config_error_renders_with_miette() {
    use miette::{Diagnostic, GraphicalReportHandler};

    let error = ConfigError::UnknownKey {
        key: "webhok_secret".to_string(),
        suggestion: Some("webhook_secret".to_string()),
        valid_keys: "api_key, webhook_secret".to_string(),
        span: None,
        src: None,
    };

    assert!(error.code().is_some(), "should have diagnostic code");
    let help = error.help().map(|h| h.to_string()).unwrap_or_default();
    assert!(help.contains("did you mean `webhook_secret`"));

    let handler = GraphicalReportHandler::new();
    let mut buf = String::new();
    handler
        .render_report(&mut buf, &error)
        .expect("should render without error");
    assert!(buf.contains("webhok_secret"));
}

/// Validation errors surface through load_and_validate_str.
#[test]
fn validation_catches_ttl_above_ceiling() {
    let toml = r#"
[access]
max_live_ttl_secs = 300
live_join_ttl_secs = 600
"#;

    let errors = load_and_validate_str(toml).expect_err("ttl above ceiling should fail");
    assert!(errors.iter().any(|e| {
        matches!(e, ConfigError::Validation { message } if message.contains("live_join_ttl_secs"))
    }));
}

#[test]
fn load_and_validate_defaults_without_secrets() {
    let config: LecternConfig = load_and_validate_str("").expect("defaults should validate");
    assert!(config.auth.jwt_secret.is_none());
}
