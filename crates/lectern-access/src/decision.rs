// SPDX-FileCopyrightText: 2026 Lectern Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Centralized access decisions for course-gated resources.
//!
//! Every protected route asks [`AccessDecisionEngine::decide`] instead of
//! checking ownership or entitlements inline. The engine only reads the
//! catalog and the entitlement store.

use std::sync::Arc;

use lectern_core::{
    Course, CourseCatalog, CourseId, EntitlementStore, LecternError, Principal, Stores,
};
use thiserror::Error;
use tracing::debug;

/// A request for a course-gated resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceRequest {
    /// List the course materials with download URLs.
    ViewMaterials(CourseId),
    /// Obtain playback for the course live stream.
    JoinLiveStream(CourseId),
    /// Provision or reuse the course live stream.
    ManageLiveStream(CourseId),
}

impl ResourceRequest {
    pub fn course(&self) -> CourseId {
        match *self {
            Self::ViewMaterials(id) | Self::JoinLiveStream(id) | Self::ManageLiveStream(id) => id,
        }
    }
}

/// Why a request was denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DenyReason {
    #[error("course not found")]
    NotFound,
    #[error("caller does not own the course")]
    NotOwner,
    #[error("caller is not entitled to the course")]
    NotEntitled,
}

/// Result of an access decision. `Allow` carries the course that was checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow(Course),
    Deny(DenyReason),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow(_))
    }

    /// Converts into a `Result` for `?`-style handling.
    pub fn into_result(self) -> Result<Course, DenyReason> {
        match self {
            Self::Allow(course) => Ok(course),
            Self::Deny(reason) => Err(reason),
        }
    }
}

/// Evaluates [`ResourceRequest`]s against the catalog and entitlement store.
#[derive(Clone)]
pub struct AccessDecisionEngine {
    courses: Arc<dyn CourseCatalog>,
    entitlements: Arc<dyn EntitlementStore>,
}

impl AccessDecisionEngine {
    pub fn new(courses: Arc<dyn CourseCatalog>, entitlements: Arc<dyn EntitlementStore>) -> Self {
        Self {
            courses,
            entitlements,
        }
    }

    pub fn from_stores(stores: &Stores) -> Self {
        Self::new(stores.courses.clone(), stores.entitlements.clone())
    }

    /// Decide whether `principal` may access `request`.
    ///
    /// Course existence is checked first for every kind, so an unknown course
    /// is reported as `NotFound` before any entitlement lookup. Store failures
    /// are returned as errors, never as a denial.
    pub async fn decide(
        &self,
        principal: &Principal,
        request: ResourceRequest,
    ) -> Result<Decision, LecternError> {
        let course_id = request.course();
        let Some(course) = self.courses.get_course(course_id).await? else {
            debug!(user = %principal.id, course = %course_id, "access denied: no such course");
            return Ok(Decision::Deny(DenyReason::NotFound));
        };

        let decision = match request {
            ResourceRequest::ManageLiveStream(_) => {
                if principal.is_instructor() && principal.id == course.instructor_id {
                    Decision::Allow(course)
                } else {
                    Decision::Deny(DenyReason::NotOwner)
                }
            }
            ResourceRequest::ViewMaterials(_) | ResourceRequest::JoinLiveStream(_) => {
                if self.entitlements.is_entitled(principal.id, course_id).await? {
                    Decision::Allow(course)
                } else {
                    Decision::Deny(DenyReason::NotEntitled)
                }
            }
        };

        if let Decision::Deny(reason) = &decision {
            debug!(user = %principal.id, course = %course_id, %reason, "access denied");
        }
        Ok(decision)
    }
}
