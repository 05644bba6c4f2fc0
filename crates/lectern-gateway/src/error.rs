// SPDX-FileCopyrightText: 2026 Lectern Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP error envelope.
//!
//! Every failure leaves the gateway as `{"error": "..."}`. Internal detail is
//! logged here and never written into the body.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use lectern_access::{DenyReason, IssueError};
use lectern_core::LecternError;
use lectern_payments::ReconciliationError;
use lectern_video::LiveStreamError;
use serde::Serialize;
use tracing::error;

/// Shared by `NotFound` and `NotEntitled` so the two are indistinguishable
/// apart from the status code.
pub const COURSE_UNAVAILABLE: &str = "course unavailable";

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug)]
pub enum ApiError {
    /// Missing or invalid bearer credential. The reason is never returned.
    Unauthorized,
    /// Access decision denial.
    Denied(DenyReason),
    /// Role check failed on an instructor-only route.
    Forbidden(&'static str),
    /// Missing or invalid request field.
    Validation(String),
    NotFound(&'static str),
    /// Webhook signature failure.
    InvalidSignature,
    /// Anything else. Logged with full context, reported generically.
    Internal(String),
}

impl ApiError {
    pub fn internal(e: impl std::fmt::Display) -> Self {
        Self::Internal(e.to_string())
    }

    fn status_and_message(&self) -> (StatusCode, &str) {
        match self {
            Self::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized"),
            Self::Denied(DenyReason::NotFound) => (StatusCode::NOT_FOUND, COURSE_UNAVAILABLE),
            Self::Denied(DenyReason::NotEntitled) => (StatusCode::FORBIDDEN, COURSE_UNAVAILABLE),
            Self::Denied(DenyReason::NotOwner) => (StatusCode::FORBIDDEN, "forbidden"),
            Self::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            Self::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Self::InvalidSignature => (StatusCode::BAD_REQUEST, "invalid signature"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal server error"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Self::Internal(detail) = &self {
            error!(error = %detail, "request failed");
        }
        let (status, message) = self.status_and_message();
        (
            status,
            Json(ErrorBody {
                error: message.to_string(),
            }),
        )
            .into_response()
    }
}

impl From<LecternError> for ApiError {
    fn from(err: LecternError) -> Self {
        match err {
            LecternError::Validation(msg) | LecternError::Conflict(msg) => Self::Validation(msg),
            other => Self::internal(other),
        }
    }
}

impl From<DenyReason> for ApiError {
    fn from(reason: DenyReason) -> Self {
        Self::Denied(reason)
    }
}

impl From<IssueError> for ApiError {
    fn from(err: IssueError) -> Self {
        // Every issuance failure at request time is a server-side problem:
        // TTLs come from configuration, not from the caller.
        Self::internal(err)
    }
}

impl From<LiveStreamError> for ApiError {
    fn from(err: LiveStreamError) -> Self {
        match err {
            LiveStreamError::Denied(reason) => Self::Denied(reason),
            LiveStreamError::NoStream => Self::NotFound("no live stream for this course"),
            LiveStreamError::NotConfigured => Self::NotFound("live stream not configured"),
            LiveStreamError::Issue(e) => e.into(),
            LiveStreamError::Store(e) => e.into(),
        }
    }
}

impl From<ReconciliationError> for ApiError {
    fn from(err: ReconciliationError) -> Self {
        match err {
            ReconciliationError::Rejected(_) => Self::InvalidSignature,
            ReconciliationError::InvalidMetadata(msg) => Self::Validation(msg),
            ReconciliationError::Store(e) => e.into(),
        }
    }
}
