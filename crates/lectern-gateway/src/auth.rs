// SPDX-FileCopyrightText: 2026 Lectern Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bearer authentication for handlers.
//!
//! Handlers that need a caller take [`AuthPrincipal`] as an argument. Every
//! failure is the same opaque 401; the reason is logged at debug level.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use lectern_core::Principal;
use tracing::debug;

use crate::error::ApiError;
use crate::state::AppState;

/// The verified caller of a request.
#[derive(Debug, Clone)]
pub struct AuthPrincipal(pub Principal);

impl AuthPrincipal {
    /// Reject callers without the instructor role.
    pub fn require_instructor(&self) -> Result<&Principal, ApiError> {
        if self.0.is_instructor() {
            Ok(&self.0)
        } else {
            Err(ApiError::Forbidden("instructor access only"))
        }
    }
}

impl FromRequestParts<AppState> for AuthPrincipal {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();

        match state.identity.verify(header) {
            Ok(principal) => Ok(Self(principal)),
            Err(reason) => {
                debug!(%reason, path = %parts.uri.path(), "bearer authentication failed");
                Err(ApiError::Unauthorized)
            }
        }
    }
}
