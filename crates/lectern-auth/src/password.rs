// SPDX-FileCopyrightText: 2026 Lectern Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Argon2id password hashing.
//!
//! Hashes are PHC strings with the algorithm parameters embedded, so they can
//! be verified after a parameter change. Both operations are CPU-bound and run
//! on the blocking pool.

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use lectern_core::LecternError;
use ring::rand::{SecureRandom, SystemRandom};
use secrecy::{ExposeSecret, SecretString};

/// Hash a password into a PHC string.
pub async fn hash_password(password: SecretString) -> Result<String, LecternError> {
    tokio::task::spawn_blocking(move || {
        let mut salt = [0u8; 16];
        SystemRandom::new()
            .fill(&mut salt)
            .map_err(|_| LecternError::Internal("failed to generate password salt".into()))?;
        let salt = SaltString::encode_b64(&salt)
            .map_err(|e| LecternError::Internal(format!("invalid password salt: {e}")))?;

        Argon2::default()
            .hash_password(password.expose_secret().as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| LecternError::Internal(format!("password hashing failed: {e}")))
    })
    .await
    .map_err(|e| LecternError::Internal(format!("password hashing task failed: {e}")))?
}

/// Check a password against a stored PHC string. A malformed stored hash
/// verifies as false.
pub async fn verify_password(password: SecretString, stored: String) -> Result<bool, LecternError> {
    tokio::task::spawn_blocking(move || {
        let Ok(parsed) = PasswordHash::new(&stored) else {
            return false;
        };
        Argon2::default()
            .verify_password(password.expose_secret().as_bytes(), &parsed)
            .is_ok()
    })
    .await
    .map_err(|e| LecternError::Internal(format!("password verification task failed: {e}")))
}
