// SPDX-FileCopyrightText: 2026 Lectern Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! RS256 playback tokens for signed video and live-stream playback.
//!
//! Tokens carry `sub` (the playback id), `aud` (`"v"` for video playback),
//! `exp`, and the credential `kind`, with the signing key id in the `kid`
//! header so the video provider can pick the matching public key.

use std::collections::HashSet;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use lectern_config::model::VideoConfig;
use lectern_core::CredentialKind;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::error::{CredentialRejected, IssueError};

/// Audience the video provider expects on playback tokens.
pub const PLAYBACK_AUDIENCE: &str = "v";

/// Claims of a playback token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackClaims {
    pub sub: String,
    pub aud: String,
    pub exp: i64,
    pub kind: CredentialKind,
}

/// Signs playback tokens with the configured RSA signing key.
pub struct PlaybackTokenSigner {
    key_id: String,
    key: EncodingKey,
}

impl PlaybackTokenSigner {
    /// `private_key` is a PEM RSA key, or the same PEM base64-encoded as the
    /// video provider hands it out.
    pub fn new(key_id: impl Into<String>, private_key: &SecretString) -> Result<Self, IssueError> {
        let pem = pem_bytes(private_key.expose_secret())?;
        let key = EncodingKey::from_rsa_pem(&pem)
            .map_err(|e| IssueError::Signing(format!("invalid playback signing key: {e}")))?;
        Ok(Self {
            key_id: key_id.into(),
            key,
        })
    }

    /// Build a signer from the `[video]` section. `Ok(None)` when no signing
    /// key pair is configured.
    pub fn from_config(config: &VideoConfig) -> Result<Option<Self>, IssueError> {
        match (&config.signing_key_id, &config.signing_key_private) {
            (Some(key_id), Some(private_key)) => Self::new(
                key_id.clone(),
                &SecretString::from(private_key.clone()),
            )
            .map(Some),
            _ => Ok(None),
        }
    }

    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    pub fn sign(
        &self,
        playback_id: &str,
        kind: CredentialKind,
        expires_at: DateTime<Utc>,
    ) -> Result<String, IssueError> {
        let mut header = Header::new(Algorithm::RS256);
        header.kid = Some(self.key_id.clone());
        let claims = PlaybackClaims {
            sub: playback_id.to_string(),
            aud: PLAYBACK_AUDIENCE.to_string(),
            exp: expires_at.timestamp(),
            kind,
        };
        jsonwebtoken::encode(&header, &claims, &self.key)
            .map_err(|e| IssueError::Signing(e.to_string()))
    }
}

/// Checks playback tokens against the public half of the signing key.
pub struct PlaybackTokenVerifier {
    key_id: String,
    key: DecodingKey,
    validation: Validation,
}

impl PlaybackTokenVerifier {
    pub fn new(key_id: impl Into<String>, public_key_pem: &[u8]) -> Result<Self, IssueError> {
        let key = DecodingKey::from_rsa_pem(public_key_pem)
            .map_err(|e| IssueError::Signing(format!("invalid playback public key: {e}")))?;
        let mut validation = Validation::new(Algorithm::RS256);
        validation.validate_exp = false;
        validation.required_spec_claims = HashSet::new();
        validation.set_audience(&[PLAYBACK_AUDIENCE]);
        Ok(Self {
            key_id: key_id.into(),
            key,
            validation,
        })
    }

    /// Verify `token` as of `now`. Accepted while `now <= exp`.
    pub fn verify_at(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<PlaybackClaims, CredentialRejected> {
        let header = jsonwebtoken::decode_header(token)
            .map_err(|_| CredentialRejected::Malformed("token is not a valid JWT"))?;
        if header.kid.as_deref() != Some(self.key_id.as_str()) {
            return Err(CredentialRejected::InvalidSignature);
        }

        let data = jsonwebtoken::decode::<PlaybackClaims>(token, &self.key, &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                    CredentialRejected::InvalidSignature
                }
                ErrorKind::InvalidAudience => CredentialRejected::Malformed("wrong audience"),
                _ => CredentialRejected::Malformed("token is not a valid JWT"),
            })?;

        if now.timestamp() > data.claims.exp {
            return Err(CredentialRejected::Expired);
        }
        Ok(data.claims)
    }
}

fn pem_bytes(raw: &str) -> Result<Vec<u8>, IssueError> {
    let trimmed = raw.trim();
    if trimmed.starts_with("-----BEGIN") {
        return Ok(trimmed.as_bytes().to_vec());
    }
    let compact: String = trimmed.chars().filter(|c| !c.is_whitespace()).collect();
    let decoded = STANDARD
        .decode(compact)
        .map_err(|_| IssueError::Signing("signing key is neither PEM nor base64 PEM".into()))?;
    if !decoded.starts_with(b"-----BEGIN") {
        return Err(IssueError::Signing("decoded signing key is not PEM".into()));
    }
    Ok(decoded)
}
