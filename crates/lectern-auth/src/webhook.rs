// SPDX-FileCopyrightText: 2026 Lectern Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Signature checks for provider notifications.
//!
//! Providers sign `"{t}.{raw body}"` with HMAC-SHA256 under a shared secret
//! and send `t=<unix seconds>,v1=<hex>` in a header. More than one `v1` may be
//! present while the provider rotates secrets; any match is accepted.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Why a notification signature was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("signature header missing")]
    MissingHeader,

    #[error("malformed signature header: {0}")]
    MalformedHeader(&'static str),

    #[error("no signature matches the payload")]
    Mismatch,

    #[error("signature timestamp is {age_secs}s away from now")]
    OutsideTolerance { age_secs: i64 },
}

/// A parsed `t=..,v1=..` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader {
    pub timestamp: i64,
    pub signatures: Vec<Vec<u8>>,
}

impl SignatureHeader {
    /// Parse a signature header. Unknown schemes (e.g. `v0`) are skipped.
    pub fn parse(raw: &str) -> Result<Self, SignatureError> {
        if raw.trim().is_empty() {
            return Err(SignatureError::MissingHeader);
        }
        let mut timestamp = None;
        let mut signatures = Vec::new();
        for item in raw.split(',') {
            let (key, value) = item
                .trim()
                .split_once('=')
                .ok_or(SignatureError::MalformedHeader("expected key=value pairs"))?;
            match key {
                "t" => {
                    let t = value
                        .parse::<i64>()
                        .map_err(|_| SignatureError::MalformedHeader("timestamp is not an integer"))?;
                    timestamp = Some(t);
                }
                "v1" => {
                    let sig = hex::decode(value)
                        .map_err(|_| SignatureError::MalformedHeader("v1 signature is not hex"))?;
                    signatures.push(sig);
                }
                _ => {}
            }
        }
        let timestamp = timestamp.ok_or(SignatureError::MalformedHeader("missing timestamp"))?;
        if signatures.is_empty() {
            return Err(SignatureError::MalformedHeader("missing v1 signature"));
        }
        Ok(Self {
            timestamp,
            signatures,
        })
    }
}

/// Verifies notification signatures for one shared secret.
#[derive(Clone)]
pub struct WebhookVerifier {
    secret: SecretString,
    tolerance_secs: i64,
}

impl WebhookVerifier {
    pub fn new(secret: SecretString, tolerance_secs: u64) -> Self {
        Self {
            secret,
            tolerance_secs: i64::try_from(tolerance_secs).unwrap_or(i64::MAX),
        }
    }

    pub fn verify(&self, payload: &[u8], header: &str) -> Result<(), SignatureError> {
        self.verify_at(payload, header, Utc::now())
    }

    /// Check `header` against the raw `payload` as of `now`.
    ///
    /// Signatures are compared in constant time. The timestamp is checked
    /// after the signature so a forged header never learns about clock skew.
    pub fn verify_at(
        &self,
        payload: &[u8],
        header: &str,
        now: DateTime<Utc>,
    ) -> Result<(), SignatureError> {
        let parsed = SignatureHeader::parse(header)?;

        let mut matched = false;
        for candidate in &parsed.signatures {
            let mac = self.mac(parsed.timestamp, payload)?;
            if mac.verify_slice(candidate).is_ok() {
                matched = true;
                break;
            }
        }
        if !matched {
            return Err(SignatureError::Mismatch);
        }

        let age_secs = now.timestamp().saturating_sub(parsed.timestamp);
        if age_secs.saturating_abs() > self.tolerance_secs {
            return Err(SignatureError::OutsideTolerance { age_secs });
        }
        Ok(())
    }

    /// Produce a header value for `payload` signed at `timestamp`.
    pub fn sign(&self, payload: &[u8], timestamp: i64) -> Result<String, SignatureError> {
        let digest = self.mac(timestamp, payload)?.finalize().into_bytes();
        Ok(format!("t={timestamp},v1={}", hex::encode(digest)))
    }

    fn mac(&self, timestamp: i64, payload: &[u8]) -> Result<HmacSha256, SignatureError> {
        let mut mac = HmacSha256::new_from_slice(self.secret.expose_secret().as_bytes())
            .map_err(|_| SignatureError::Mismatch)?;
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload);
        Ok(mac)
    }
}
