// SPDX-FileCopyrightText: 2026 Lectern Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Course catalog and course materials.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use lectern_access::{DenyReason, ResourceRequest};
use lectern_core::{CredentialKind, NewCourse};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{CourseView, course_id, json_body, required};
use crate::auth::AuthPrincipal;
use crate::error::{ApiError, COURSE_UNAVAILABLE};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCourseRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price_cents: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddMaterialRequest {
    pub file_name: Option<String>,
    pub storage_key: Option<String>,
}

/// A material with a short-lived download URL.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialView {
    pub id: i64,
    pub file_name: String,
    pub signed_url: String,
}

/// GET /courses
pub async fn list_courses(
    State(state): State<AppState>,
) -> Result<Json<Vec<CourseView>>, ApiError> {
    let courses = state.stores.courses.list_courses().await?;
    Ok(Json(courses.into_iter().map(CourseView::from).collect()))
}

/// POST /courses
///
/// The caller becomes the owning instructor.
pub async fn create_course(
    State(state): State<AppState>,
    caller: AuthPrincipal,
    body: Result<Json<CreateCourseRequest>, JsonRejection>,
) -> Result<Json<CourseView>, ApiError> {
    let instructor = caller.require_instructor()?;
    let body = json_body(body)?;
    let title = required(body.title, "title")?;
    let price_cents = body
        .price_cents
        .ok_or_else(|| ApiError::Validation("priceCents is required".into()))?;
    if price_cents < 0 {
        return Err(ApiError::Validation("priceCents must not be negative".into()));
    }

    let course = state
        .stores
        .courses
        .create_course(NewCourse {
            title,
            description: body.description.filter(|d| !d.trim().is_empty()),
            price_cents,
            instructor_id: instructor.id,
        })
        .await?;
    info!(course = %course.id, instructor = %instructor.id, "course created");
    Ok(Json(course.into()))
}

/// GET /courses/{id}
pub async fn get_course(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<CourseView>, ApiError> {
    let id = course_id(&raw_id)?;
    let course = state
        .stores
        .courses
        .get_course(id)
        .await?
        .ok_or(ApiError::NotFound(COURSE_UNAVAILABLE))?;
    Ok(Json(course.into()))
}

/// GET /courses/{id}/materials
pub async fn list_materials(
    State(state): State<AppState>,
    AuthPrincipal(principal): AuthPrincipal,
    Path(raw_id): Path<String>,
) -> Result<Json<Vec<MaterialView>>, ApiError> {
    let id = course_id(&raw_id)?;
    state
        .decisions
        .decide(&principal, ResourceRequest::ViewMaterials(id))
        .await?
        .into_result()?;

    let ttl = state.settings.materials_ttl_secs;
    let materials = state.stores.materials.list_materials(id).await?;
    let mut views = Vec::with_capacity(materials.len());
    for material in materials {
        let credential = state
            .issuer
            .issue(&material.storage_key, CredentialKind::StorageObject, ttl)?;
        views.push(MaterialView {
            id: material.id,
            file_name: material.file_name,
            signed_url: credential.url,
        });
    }
    Ok(Json(views))
}

/// POST /courses/{id}/materials
///
/// Registers an object already uploaded to the materials bucket. Owner only.
pub async fn add_material(
    State(state): State<AppState>,
    AuthPrincipal(principal): AuthPrincipal,
    Path(raw_id): Path<String>,
    body: Result<Json<AddMaterialRequest>, JsonRejection>,
) -> Result<Json<MaterialView>, ApiError> {
    let id = course_id(&raw_id)?;
    let course = state
        .stores
        .courses
        .get_course(id)
        .await?
        .ok_or(ApiError::NotFound(COURSE_UNAVAILABLE))?;
    if !principal.is_instructor() || course.instructor_id != principal.id {
        return Err(DenyReason::NotOwner.into());
    }

    let body = json_body(body)?;
    let file_name = required(body.file_name, "fileName")?;
    let storage_key = required(body.storage_key, "storageKey")?;
    if storage_key.starts_with('/') || storage_key.split('/').any(|part| part == "..") {
        return Err(ApiError::Validation("storageKey must be a relative object key".into()));
    }

    let material = state
        .stores
        .materials
        .add_material(id, &file_name, &storage_key)
        .await?;
    info!(course = %id, material = material.id, "material added");

    let credential = state.issuer.issue(
        &material.storage_key,
        CredentialKind::StorageObject,
        state.settings.materials_ttl_secs,
    )?;
    Ok(Json(MaterialView {
        id: material.id,
        file_name: material.file_name,
        signed_url: credential.url,
    }))
}
