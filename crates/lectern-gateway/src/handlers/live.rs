// SPDX-FileCopyrightText: 2026 Lectern Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Live stream routes and video provider notifications.

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use lectern_video::{JoinInfo, LiveStatus, StartedStream};
use serde_json::{Value, json};

use super::course_id;
use crate::auth::AuthPrincipal;
use crate::error::ApiError;
use crate::state::AppState;

/// Header carrying the video provider's `t=..,v1=..` signature.
pub const VIDEO_SIGNATURE_HEADER: &str = "mux-signature";

/// POST /courses/{id}/live
pub async fn start_live(
    State(state): State<AppState>,
    AuthPrincipal(principal): AuthPrincipal,
    Path(raw_id): Path<String>,
) -> Result<Json<StartedStream>, ApiError> {
    let id = course_id(&raw_id)?;
    Ok(Json(state.live.start(&principal, id).await?))
}

/// GET /courses/{id}/live/status
pub async fn live_status(
    State(state): State<AppState>,
    _caller: AuthPrincipal,
    Path(raw_id): Path<String>,
) -> Result<Json<LiveStatus>, ApiError> {
    let id = course_id(&raw_id)?;
    Ok(Json(state.live.status(id).await?))
}

/// GET /courses/{id}/live/join
pub async fn join_live(
    State(state): State<AppState>,
    AuthPrincipal(principal): AuthPrincipal,
    Path(raw_id): Path<String>,
) -> Result<Json<JoinInfo>, ApiError> {
    let id = course_id(&raw_id)?;
    Ok(Json(state.live.join(&principal, id).await?))
}

/// POST /video/webhooks/provider
///
/// Takes the body as raw bytes so the signature covers exactly what was sent.
pub async fn video_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let signature = headers
        .get(VIDEO_SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());
    state
        .video_webhooks
        .handle(&body, signature)
        .await
        .map_err(|_| ApiError::InvalidSignature)?;
    Ok(Json(json!({ "received": true })))
}
