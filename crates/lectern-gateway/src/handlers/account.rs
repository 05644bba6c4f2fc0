// SPDX-FileCopyrightText: 2026 Lectern Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Registration and login.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use lectern_auth::{hash_password, verify_password};
use lectern_core::{NewUser, Principal, Role, User, UserId};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{json_body, required};
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    /// Defaults to `student`.
    pub role: Option<Role>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// An account as returned by the API. Never carries the password hash.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub user: UserView,
    pub token: String,
}

fn session(state: &AppState, user: User) -> Result<Json<SessionResponse>, ApiError> {
    let principal = Principal {
        id: user.id,
        email: user.email.clone(),
        role: user.role,
    };
    let token = state.tokens.issue(&principal)?;
    Ok(Json(SessionResponse {
        user: user.into(),
        token,
    }))
}

/// POST /auth/register
pub async fn register(
    State(state): State<AppState>,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Json<SessionResponse>, ApiError> {
    let body = json_body(body)?;
    let name = required(body.name, "name")?;
    let email = required(body.email, "email")?.to_lowercase();
    let password = body
        .password
        .filter(|p| !p.is_empty())
        .ok_or_else(|| ApiError::Validation("password is required".into()))?;

    let password_hash = hash_password(SecretString::from(password)).await?;
    // A taken email surfaces as a Conflict, reported as 400.
    let user = state
        .stores
        .users
        .create_user(NewUser {
            name,
            email,
            password_hash,
            role: body.role.unwrap_or(Role::Student),
        })
        .await?;
    info!(user = %user.id, role = %user.role, "account registered");
    session(&state, user)
}

/// POST /auth/login
pub async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<SessionResponse>, ApiError> {
    let body = json_body(body)?;
    let email = required(body.email, "email")?.to_lowercase();
    let password = body
        .password
        .filter(|p| !p.is_empty())
        .ok_or_else(|| ApiError::Validation("password is required".into()))?;

    let invalid = || ApiError::Validation("invalid credentials".into());
    let Some((user, stored_hash)) = state.stores.users.find_user_by_email(&email).await? else {
        debug!("login for unknown email");
        return Err(invalid());
    };
    if !verify_password(SecretString::from(password), stored_hash).await? {
        debug!(user = %user.id, "login with wrong password");
        return Err(invalid());
    }
    session(&state, user)
}
