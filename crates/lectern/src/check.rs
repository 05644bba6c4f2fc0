// SPDX-FileCopyrightText: 2026 Lectern Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `lectern config check`: print a redacted summary of the loaded config.

use lectern_config::{LecternConfig, env_var_for};

/// Print the configuration and any secrets `serve` would refuse to start without.
///
/// Secret-bearing sections redact themselves in `Debug`.
pub fn run_check(config: &LecternConfig) {
    println!("{}", summary(config));
}

fn summary(config: &LecternConfig) -> String {
    let mut out = format!("configuration is valid\n\n{config:#?}\n");
    let missing = lectern_config::missing_secrets(config);
    if missing.is_empty() {
        out.push_str("\nall secrets required by `serve` are set\n");
    } else {
        out.push_str("\nmissing secrets required by `serve`:\n");
        for key in missing {
            out.push_str(&format!("  - {key} (or {})\n", env_var_for(key)));
        }
    }
    out
}
