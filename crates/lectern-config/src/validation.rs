// SPDX-FileCopyrightText: 2026 Lectern Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that serde attributes cannot express:
//! bind addresses, absolute URLs, and credential lifetime ceilings.
//! Presence of secrets is checked separately by [`missing_secrets`], because
//! `config check` and `migrate` must work without them.

use crate::diagnostic::ConfigError;
use crate::model::LecternConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &LecternConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let host = config.server.host.trim();
    if host.is_empty() {
        errors.push(validation("server.host must not be empty"));
    } else {
        let is_valid_ip = host.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-');
        if !is_valid_ip && !is_valid_hostname {
            errors.push(validation(format!(
                "server.host `{host}` is not a valid IP address or hostname"
            )));
        }
    }

    if config.server.port == 0 {
        errors.push(validation("server.port must be non-zero"));
    }

    check_absolute_url(&mut errors, "server.app_url", &config.server.app_url);
    check_absolute_url(&mut errors, "payments.api_base", &config.payments.api_base);
    check_absolute_url(&mut errors, "video.api_base", &config.video.api_base);
    check_absolute_url(&mut errors, "video.stream_base", &config.video.stream_base);
    if let Some(endpoint) = &config.object_storage.endpoint {
        check_absolute_url(&mut errors, "object_storage.endpoint", endpoint);
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(validation("storage.database_path must not be empty"));
    }

    if config.auth.token_ttl_secs == 0 {
        errors.push(validation("auth.token_ttl_secs must be positive"));
    }

    if config.payments.currency.len() != 3
        || !config.payments.currency.chars().all(|c| c.is_ascii_alphabetic())
    {
        errors.push(validation(format!(
            "payments.currency `{}` is not a three-letter currency code",
            config.payments.currency
        )));
    }

    if config.video.signing_key_id.is_some() != config.video.signing_key_private.is_some() {
        errors.push(validation(
            "video.signing_key_id and video.signing_key_private must be set together",
        ));
    }

    let access = &config.access;
    for (key, value) in [
        ("access.max_storage_ttl_secs", access.max_storage_ttl_secs),
        ("access.max_live_ttl_secs", access.max_live_ttl_secs),
        ("access.max_video_ttl_secs", access.max_video_ttl_secs),
        ("access.materials_ttl_secs", access.materials_ttl_secs),
        ("access.live_join_ttl_secs", access.live_join_ttl_secs),
    ] {
        if value == 0 {
            errors.push(validation(format!("{key} must be positive")));
        }
    }

    if access.materials_ttl_secs > access.max_storage_ttl_secs {
        errors.push(validation(format!(
            "access.materials_ttl_secs ({}) exceeds access.max_storage_ttl_secs ({})",
            access.materials_ttl_secs, access.max_storage_ttl_secs
        )));
    }

    if access.live_join_ttl_secs > access.max_live_ttl_secs {
        errors.push(validation(format!(
            "access.live_join_ttl_secs ({}) exceeds access.max_live_ttl_secs ({})",
            access.live_join_ttl_secs, access.max_live_ttl_secs
        )));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// List the secrets `serve` needs that are not configured, as dotted keys.
pub fn missing_secrets(config: &LecternConfig) -> Vec<&'static str> {
    let required: [(&'static str, bool); 8] = [
        ("auth.jwt_secret", config.auth.jwt_secret.is_some()),
        ("payments.api_key", config.payments.api_key.is_some()),
        ("payments.webhook_secret", config.payments.webhook_secret.is_some()),
        ("video.token_id", config.video.token_id.is_some()),
        ("video.token_secret", config.video.token_secret.is_some()),
        (
            "object_storage.access_key_id",
            config.object_storage.access_key_id.is_some(),
        ),
        (
            "object_storage.secret_access_key",
            config.object_storage.secret_access_key.is_some(),
        ),
        ("object_storage.bucket", config.object_storage.bucket.is_some()),
    ];

    required
        .into_iter()
        .filter(|(_, present)| !present)
        .map(|(key, _)| key)
        .collect()
}

fn check_absolute_url(errors: &mut Vec<ConfigError>, key: &str, value: &str) {
    if !(value.starts_with("http://") || value.starts_with("https://")) {
        errors.push(validation(format!(
            "{key} `{value}` must be an absolute http(s) URL"
        )));
    }
}

fn validation(message: impl Into<String>) -> ConfigError {
    ConfigError::Validation {
        message: message.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn has_error(errors: &[ConfigError], needle: &str) -> bool {
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains(needle)))
    }

    #[test]
    fn default_config_validates() {
        let config = LecternConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn empty_database_path_fails_validation() {
        let mut config = LecternConfig::default();
        config.storage.database_path = "".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "database_path"));
    }

    #[test]
    fn relative_app_url_fails_validation() {
        let mut config = LecternConfig::default();
        config.server.app_url = "localhost:5173".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "server.app_url"));
    }

    #[test]
    fn zero_ttl_ceiling_fails_validation() {
        let mut config = LecternConfig::default();
        config.access.max_video_ttl_secs = 0;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "access.max_video_ttl_secs must be positive"));
    }

    #[test]
    fn request_ttl_above_ceiling_fails_validation() {
        let mut config = LecternConfig::default();
        config.access.materials_ttl_secs = 900;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "exceeds access.max_storage_ttl_secs"));
    }

    #[test]
    fn half_configured_signing_key_fails_validation() {
        let mut config = LecternConfig::default();
        config.video.signing_key_id = Some("kid".into());
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "must be set together"));
    }

    #[test]
    fn collects_all_errors() {
        let mut config = LecternConfig::default();
        config.server.host = "bad host!".to_string();
        config.payments.currency = "dollars".to_string();
        config.auth.token_ttl_secs = 0;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn missing_secrets_lists_every_unset_key() {
        let config = LecternConfig::default();
        let missing = missing_secrets(&config);
        assert_eq!(missing.len(), 8);
        assert!(missing.contains(&"auth.jwt_secret"));
        assert!(missing.contains(&"object_storage.bucket"));
    }

    #[test]
    fn missing_secrets_empty_when_configured() {
        let mut config = LecternConfig::default();
        config.auth.jwt_secret = Some("s".into());
        config.payments.api_key = Some("k".into());
        config.payments.webhook_secret = Some("w".into());
        config.video.token_id = Some("id".into());
        config.video.token_secret = Some("secret".into());
        config.object_storage.access_key_id = Some("AKID".into());
        config.object_storage.secret_access_key = Some("sk".into());
        config.object_storage.bucket = Some("materials".into());
        assert!(missing_secrets(&config).is_empty());
    }
}
