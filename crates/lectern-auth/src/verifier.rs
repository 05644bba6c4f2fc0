// SPDX-FileCopyrightText: 2026 Lectern Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bearer identity token verification.
//!
//! Checks run in a fixed order: scheme, token structure, signature, expiry,
//! then claim shape. A token whose claims are incomplete is never given an
//! implicit role.

use std::collections::HashSet;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use lectern_core::{Principal, Role, UserId};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use thiserror::Error;

const BEARER_PREFIX: &str = "Bearer ";

/// Why a bearer credential was refused. Callers present all variants as the
/// same opaque 401; the distinction exists for logs and tests.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerificationError {
    /// Empty header, unknown scheme, or a token that does not decode as a JWT.
    #[error("malformed credential: {0}")]
    MalformedCredential(&'static str),

    /// Signature mismatch or an algorithm other than HS256.
    #[error("invalid token signature")]
    InvalidSignature,

    /// The `exp` claim is in the past.
    #[error("token expired")]
    Expired,

    /// A required claim is missing or has the wrong shape.
    #[error("malformed claims: {0}")]
    MalformedClaims(String),
}

/// Verifies HS256 identity tokens against the server secret.
pub struct IdentityTokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl IdentityTokenVerifier {
    pub fn new(secret: &SecretString) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry and required claims are checked by hand so each failure maps
        // to its own variant against an injectable clock.
        validation.validate_exp = false;
        validation.required_spec_claims = HashSet::new();
        Self {
            key: DecodingKey::from_secret(secret.expose_secret().as_bytes()),
            validation,
        }
    }

    /// Verify an `Authorization` header value against the current time.
    pub fn verify(&self, header_value: &str) -> Result<Principal, VerificationError> {
        self.verify_at(header_value, Utc::now())
    }

    /// Verify an `Authorization` header value as of `now`.
    pub fn verify_at(
        &self,
        header_value: &str,
        now: DateTime<Utc>,
    ) -> Result<Principal, VerificationError> {
        let token = bearer_token(header_value)?;

        let data = jsonwebtoken::decode::<Value>(token, &self.key, &self.validation).map_err(
            |e| match e.kind() {
                ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                    VerificationError::InvalidSignature
                }
                _ => VerificationError::MalformedCredential("token is not a valid JWT"),
            },
        )?;
        let claims = data.claims;

        let exp = claims
            .get("exp")
            .and_then(Value::as_i64)
            .ok_or_else(|| VerificationError::MalformedClaims("exp must be an integer".into()))?;
        if now.timestamp() > exp {
            return Err(VerificationError::Expired);
        }

        principal_from_claims(&claims)
    }
}

/// Strip the `Bearer ` scheme from a header value.
pub fn bearer_token(header_value: &str) -> Result<&str, VerificationError> {
    if header_value.trim().is_empty() {
        return Err(VerificationError::MalformedCredential("empty credential"));
    }
    let token = header_value
        .strip_prefix(BEARER_PREFIX)
        .ok_or(VerificationError::MalformedCredential("expected Bearer scheme"))?
        .trim();
    if token.is_empty() {
        return Err(VerificationError::MalformedCredential("empty bearer token"));
    }
    Ok(token)
}

fn principal_from_claims(claims: &Value) -> Result<Principal, VerificationError> {
    let id = claims
        .get("id")
        .and_then(Value::as_i64)
        .ok_or_else(|| VerificationError::MalformedClaims("id must be an integer".into()))?;
    let email = claims
        .get("email")
        .and_then(Value::as_str)
        .filter(|e| !e.is_empty())
        .ok_or_else(|| VerificationError::MalformedClaims("email must be a string".into()))?;
    let role = claims
        .get("role")
        .and_then(Value::as_str)
        .ok_or_else(|| VerificationError::MalformedClaims("role must be a string".into()))?;
    let role = Role::from_str(role)
        .map_err(|_| VerificationError::MalformedClaims(format!("unknown role `{role}`")))?;

    Ok(Principal {
        id: UserId(id),
        email: email.to_string(),
        role,
    })
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};
    use jsonwebtoken::{EncodingKey, Header};
    use serde_json::json;

    use super::*;

    const SECRET: &str = "test-jwt-secret";

    fn verifier() -> IdentityTokenVerifier {
        IdentityTokenVerifier::new(&SecretString::from(SECRET.to_string()))
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap()
    }

    fn sign(claims: &Value, secret: &str) -> String {
        jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn bearer(claims: &Value) -> String {
        format!("Bearer {}", sign(claims, SECRET))
    }

    fn valid_claims() -> Value {
        json!({
            "id": 7,
            "email": "bo@example.com",
            "role": "student",
            "exp": (now() + Duration::hours(1)).timestamp(),
        })
    }

    #[test]
    fn valid_token_yields_principal() {
        let principal = verifier().verify_at(&bearer(&valid_claims()), now()).unwrap();
        assert_eq!(principal.id, UserId(7));
        assert_eq!(principal.email, "bo@example.com");
        assert_eq!(principal.role, Role::Student);
    }

    #[test]
    fn missing_or_foreign_scheme_is_malformed() {
        let v = verifier();
        let token = sign(&valid_claims(), SECRET);
        for header in ["", "   ", "Bearer ", token.as_str(), &format!("Basic {token}")] {
            assert!(
                matches!(
                    v.verify_at(header, now()),
                    Err(VerificationError::MalformedCredential(_))
                ),
                "header {header:?} should be malformed"
            );
        }
    }

    #[test]
    fn garbage_token_is_malformed() {
        let result = verifier().verify_at("Bearer not.a.jwt", now());
        assert!(matches!(result, Err(VerificationError::MalformedCredential(_))));
    }

    #[test]
    fn wrong_secret_is_invalid_signature() {
        let header = format!("Bearer {}", sign(&valid_claims(), "other-secret"));
        assert_eq!(
            verifier().verify_at(&header, now()),
            Err(VerificationError::InvalidSignature)
        );
    }

    #[test]
    fn tampered_payload_is_invalid_signature() {
        let token = sign(&valid_claims(), SECRET);
        let mut parts: Vec<String> = token.split('.').map(String::from).collect();
        let forged = sign(
            &json!({"id": 1, "email": "x@example.com", "role": "instructor", "exp": 4102444800i64}),
            "attacker",
        );
        parts[1] = forged.split('.').nth(1).unwrap().to_string();
        let header = format!("Bearer {}", parts.join("."));
        assert_eq!(
            verifier().verify_at(&header, now()),
            Err(VerificationError::InvalidSignature)
        );
    }

    #[test]
    fn expiry_boundary() {
        let mut claims = valid_claims();
        let exp = now() + Duration::seconds(60);
        claims["exp"] = json!(exp.timestamp());
        let header = bearer(&claims);

        assert!(verifier().verify_at(&header, exp - Duration::seconds(1)).is_ok());
        assert!(verifier().verify_at(&header, exp).is_ok());
        assert_eq!(
            verifier().verify_at(&header, exp + Duration::seconds(1)),
            Err(VerificationError::Expired)
        );
    }

    #[test]
    fn missing_claims_are_malformed_claims() {
        for missing in ["id", "email", "role", "exp"] {
            let mut claims = valid_claims();
            claims.as_object_mut().unwrap().remove(missing);
            assert!(
                matches!(
                    verifier().verify_at(&bearer(&claims), now()),
                    Err(VerificationError::MalformedClaims(_))
                ),
                "missing {missing} should be MalformedClaims"
            );
        }
    }

    #[test]
    fn wrong_shaped_claims_are_malformed_claims() {
        let cases = [
            ("id", json!("7")),
            ("email", json!(42)),
            ("role", json!("admin")),
            ("role", json!(null)),
        ];
        for (field, value) in cases {
            let mut claims = valid_claims();
            claims[field] = value.clone();
            assert!(
                matches!(
                    verifier().verify_at(&bearer(&claims), now()),
                    Err(VerificationError::MalformedClaims(_))
                ),
                "{field} = {value} should be MalformedClaims"
            );
        }
    }

    #[test]
    fn other_algorithms_are_refused() {
        let token = jsonwebtoken::encode(
            &Header::new(Algorithm::HS512),
            &valid_claims(),
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();
        assert_eq!(
            verifier().verify_at(&format!("Bearer {token}"), now()),
            Err(VerificationError::InvalidSignature)
        );
    }

    #[test]
    fn bearer_token_strips_scheme() {
        assert_eq!(bearer_token("Bearer abc.def.ghi").unwrap(), "abc.def.ghi");
    }
}
