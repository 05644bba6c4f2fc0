// SPDX-FileCopyrightText: 2026 Lectern Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Access decisions and signed credential issuance.
//!
//! [`AccessDecisionEngine`] answers whether a principal may reach a course
//! resource; [`CredentialIssuer`] then mints the short-lived URL or token the
//! client presents to object storage or the video CDN.

pub mod decision;
pub mod error;
pub mod issuer;
pub mod playback;
pub mod storage_url;

pub use decision::{AccessDecisionEngine, Decision, DenyReason, ResourceRequest};
pub use error::{CredentialRejected, IssueError};
pub use issuer::{CredentialIssuer, TtlLimits, check_ttl};
pub use playback::{PlaybackClaims, PlaybackTokenSigner, PlaybackTokenVerifier};
pub use storage_url::{PresignedUrl, StorageUrlSigner};
