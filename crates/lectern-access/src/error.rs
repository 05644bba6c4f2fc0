// SPDX-FileCopyrightText: 2026 Lectern Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for credential issuance and local credential checks.

use lectern_core::{CredentialKind, LecternError};
use thiserror::Error;

/// Why a signed credential could not be minted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IssueError {
    /// A zero TTL was requested.
    #[error("credential ttl must be positive")]
    InvalidTtl,

    /// The requested TTL is above the configured ceiling for the kind.
    #[error("requested ttl of {requested}s for {kind} exceeds the {ceiling}s ceiling")]
    TtlExceeded {
        kind: CredentialKind,
        requested: u64,
        ceiling: u64,
    },

    /// No signer is configured for the kind.
    #[error("no signer configured for {0}")]
    SignerUnavailable(CredentialKind),

    /// The signer rejected its key material or failed to sign.
    #[error("signing failed: {0}")]
    Signing(String),
}

impl From<IssueError> for LecternError {
    fn from(err: IssueError) -> Self {
        match err {
            IssueError::InvalidTtl | IssueError::TtlExceeded { .. } => {
                LecternError::Validation(err.to_string())
            }
            IssueError::SignerUnavailable(_) => LecternError::Config(err.to_string()),
            IssueError::Signing(_) => LecternError::Security(err.to_string()),
        }
    }
}

/// Why a presented credential was refused by a local verifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialRejected {
    #[error("malformed credential: {0}")]
    Malformed(&'static str),

    #[error("credential signature mismatch")]
    InvalidSignature,

    #[error("credential expired")]
    Expired,
}
