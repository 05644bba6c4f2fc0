// SPDX-FileCopyrightText: 2026 Lectern Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Identity for the Lectern service.
//!
//! Verifies HS256 bearer identity tokens into a [`Principal`](lectern_core::Principal),
//! mints them at login, and hashes account passwords with Argon2id. Provider
//! notifications are authenticated by [`WebhookVerifier`].

pub mod password;
pub mod token;
pub mod verifier;
pub mod webhook;

pub use password::{hash_password, verify_password};
pub use token::IdentityTokenIssuer;
pub use verifier::{IdentityTokenVerifier, VerificationError, bearer_token};
pub use webhook::{SignatureError, SignatureHeader, WebhookVerifier};
