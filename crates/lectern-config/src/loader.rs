// SPDX-FileCopyrightText: 2026 Lectern Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./lectern.toml` > `~/.config/lectern/lectern.toml` > `/etc/lectern/lectern.toml`
//! with environment variable overrides via `LECTERN_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::LecternConfig;

/// Prefix of every environment override.
pub(crate) const ENV_PREFIX: &str = "LECTERN_";

/// Config sections that env vars can address. `object_storage` must precede
/// `storage` so `LECTERN_OBJECT_STORAGE_BUCKET` is not read as `storage.*`.
const ENV_SECTIONS: &[&str] = &[
    "object_storage",
    "server",
    "storage",
    "auth",
    "payments",
    "video",
    "access",
];

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/lectern/lectern.toml` (system-wide)
/// 3. `~/.config/lectern/lectern.toml` (user XDG config)
/// 4. `./lectern.toml` (local directory)
/// 5. `LECTERN_*` environment variables
pub fn load_config() -> Result<LecternConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env vars).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<LecternConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(LecternConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<LecternConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(LecternConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(LecternConfig::default()))
        .merge(Toml::file("/etc/lectern/lectern.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("lectern/lectern.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("lectern.toml"))
        .merge(env_provider())
}

/// Create the environment variable provider using explicit section mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` because key names contain
/// underscores: `LECTERN_PAYMENTS_WEBHOOK_SECRET` must map to
/// `payments.webhook_secret`, not `payments.webhook.secret`.
fn env_provider() -> Env {
    Env::prefixed(ENV_PREFIX).map(|key| map_env_key(key.as_str()).into())
}

/// Map a prefix-stripped env var name to a dotted config path.
///
/// Figment passes the key to `map` in its original case, so it is lowercased
/// here before matching section names.
pub(crate) fn map_env_key(key: &str) -> String {
    let key = key.to_ascii_lowercase();
    for section in ENV_SECTIONS {
        if let Some(rest) = key
            .strip_prefix(section)
            .and_then(|r| r.strip_prefix('_'))
        {
            return format!("{section}.{rest}");
        }
    }
    key
}
