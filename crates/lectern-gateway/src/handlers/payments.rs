// SPDX-FileCopyrightText: 2026 Lectern Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Checkout, payment notifications, and purchased courses.

use axum::Json;
use axum::body::Bytes;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use lectern_core::{CheckoutRequest, CourseId};
use lectern_payments::ReconcileOutcome;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::debug;

use super::{CourseView, json_body};
use crate::auth::AuthPrincipal;
use crate::error::{ApiError, COURSE_UNAVAILABLE};
use crate::state::AppState;

/// Header carrying the payment provider's `t=..,v1=..` signature.
pub const PAYMENT_SIGNATURE_HEADER: &str = "stripe-signature";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    pub course_id: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionResponse {
    pub checkout_url: String,
}

#[derive(Debug, Serialize)]
pub struct VerifySessionResponse {
    pub applied: bool,
}

/// POST /payments/checkout/create-session
pub async fn create_session(
    State(state): State<AppState>,
    AuthPrincipal(principal): AuthPrincipal,
    body: Result<Json<CreateSessionRequest>, JsonRejection>,
) -> Result<Json<CreateSessionResponse>, ApiError> {
    let body = json_body(body)?;
    let course_id = body
        .course_id
        .map(CourseId)
        .ok_or_else(|| ApiError::Validation("courseId is required".into()))?;
    let course = state
        .stores
        .courses
        .get_course(course_id)
        .await?
        .ok_or(ApiError::NotFound(COURSE_UNAVAILABLE))?;

    let app_url = &state.settings.app_url;
    let session = state
        .payments
        .create_checkout_session(CheckoutRequest {
            course_id: course.id,
            user_id: principal.id,
            course_title: course.title,
            unit_amount_cents: course.price_cents,
            currency: state.settings.currency.clone(),
            success_url: format!(
                "{app_url}/checkout/success?session_id={{CHECKOUT_SESSION_ID}}"
            ),
            cancel_url: format!("{app_url}/courses/{}", course.id),
        })
        .await?;

    let checkout_url = session.url.ok_or_else(|| {
        ApiError::internal(format!("checkout session {} has no url", session.id))
    })?;
    Ok(Json(CreateSessionResponse { checkout_url }))
}

/// POST /payments/webhooks/provider
///
/// Takes the body as raw bytes so the signature covers exactly what was sent.
/// Only a signature failure is reported; everything after it is acknowledged.
pub async fn payment_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let signature = headers
        .get(PAYMENT_SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    let outcome = state.reconciliation.handle(&body, signature).await?;
    debug!(?outcome, "payment notification handled");
    Ok(Json(json!({ "received": true })))
}

/// GET /payments/verify-session/{id}
///
/// Fallback for environments where notifications cannot reach the server:
/// fetch the session from the provider and apply it directly.
pub async fn verify_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<VerifySessionResponse>, ApiError> {
    let session = state
        .payments
        .retrieve_checkout_session(&session_id)
        .await?;
    let outcome = state.reconciliation.reconcile_session(&session).await?;
    let applied = matches!(
        outcome,
        ReconcileOutcome::Applied { .. } | ReconcileOutcome::Duplicate { .. }
    );
    Ok(Json(VerifySessionResponse { applied }))
}

/// GET /payments/my-courses
pub async fn my_courses(
    State(state): State<AppState>,
    AuthPrincipal(principal): AuthPrincipal,
) -> Result<Json<Vec<CourseView>>, ApiError> {
    let ids = state.stores.entitlements.list_for_user(principal.id).await?;
    let courses = state.stores.courses.courses_by_ids(&ids).await?;
    Ok(Json(courses.into_iter().map(CourseView::from).collect()))
}
