// SPDX-FileCopyrightText: 2026 Lectern Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers, grouped by resource.

pub mod account;
pub mod courses;
pub mod live;
pub mod payments;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use chrono::{DateTime, Utc};
use lectern_core::{Course, CourseId, UserId};
use serde::Serialize;

use crate::error::{ApiError, COURSE_UNAVAILABLE};

/// Response body for `GET /health`.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// A course as returned by the API.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseView {
    pub id: CourseId,
    pub title: String,
    pub description: Option<String>,
    pub price_cents: i64,
    pub instructor_id: UserId,
    pub created_at: DateTime<Utc>,
}

impl From<Course> for CourseView {
    fn from(course: Course) -> Self {
        Self {
            id: course.id,
            title: course.title,
            description: course.description,
            price_cents: course.price_cents,
            instructor_id: course.instructor_id,
            created_at: course.created_at,
        }
    }
}

/// Parse a `{id}` path segment. Anything that is not a positive integer
/// cannot name a course and is reported like a missing one.
pub(crate) fn course_id(raw: &str) -> Result<CourseId, ApiError> {
    raw.parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .map(CourseId)
        .ok_or(ApiError::NotFound(COURSE_UNAVAILABLE))
}

/// Unwrap a JSON body, turning axum's rejection into a 400.
pub(crate) fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    body.map(|Json(value)| value).map_err(|rejection| {
        ApiError::Validation(format!("invalid JSON body: {}", rejection.body_text()))
    })
}

/// A required, non-blank string field.
pub(crate) fn required(value: Option<String>, field: &str) -> Result<String, ApiError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::Validation(format!("{field} is required")))
}
