// SPDX-FileCopyrightText: 2026 Lectern Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Identity token issuance for login and registration.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use lectern_core::{LecternError, Principal, Role};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct IdentityClaims<'a> {
    id: i64,
    email: &'a str,
    role: Role,
    iat: i64,
    exp: i64,
}

/// Mints HS256 identity tokens with a fixed lifetime.
pub struct IdentityTokenIssuer {
    key: EncodingKey,
    ttl: Duration,
}

impl IdentityTokenIssuer {
    pub fn new(secret: &SecretString, ttl_secs: u64) -> Self {
        Self {
            key: EncodingKey::from_secret(secret.expose_secret().as_bytes()),
            ttl: Duration::seconds(ttl_secs.min(i32::MAX as u64) as i64),
        }
    }

    pub fn issue(&self, principal: &Principal) -> Result<String, LecternError> {
        self.issue_at(principal, Utc::now())
    }

    pub fn issue_at(&self, principal: &Principal, now: DateTime<Utc>) -> Result<String, LecternError> {
        let claims = IdentityClaims {
            id: principal.id.0,
            email: &principal.email,
            role: principal.role,
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.key)
            .map_err(|e| LecternError::Internal(format!("failed to sign identity token: {e}")))
    }
}
