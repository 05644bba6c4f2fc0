// SPDX-FileCopyrightText: 2026 Lectern Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types shared by every Lectern store, provider, and service.

use thiserror::Error;

/// The primary error type used across all Lectern traits and core operations.
#[derive(Debug, Error)]
pub enum LecternError {
    /// Configuration errors (invalid TOML, missing secrets, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, constraint violation).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// External provider errors (payment, video, or object-storage API failure).
    #[error("provider error: {message}")]
    Provider {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A request was missing a required field or carried an invalid value.
    #[error("validation error: {0}")]
    Validation(String),

    /// A uniqueness rule rejected the write (e.g. an email already registered).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Signature, credential, or password verification failed.
    #[error("security error: {0}")]
    Security(String),

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl LecternError {
    /// Wraps any error as a provider failure with a short context message.
    pub fn provider<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Provider {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}
