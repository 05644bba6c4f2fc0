// SPDX-FileCopyrightText: 2026 Lectern Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `lectern migrate`: open the database, which applies embedded migrations.

use lectern_config::LecternConfig;
use lectern_core::LecternError;
use lectern_storage::Database;

pub async fn run_migrate(config: &LecternConfig) -> Result<(), LecternError> {
    let path = &config.storage.database_path;
    Database::open(path, config.storage.wal_mode).await?;
    println!("lectern: database at {path} is up to date");
    Ok(())
}
