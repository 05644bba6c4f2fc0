// SPDX-FileCopyrightText: 2026 Lectern Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared across the Lectern workspace.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Unique identifier for a user account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

/// Unique identifier for a course.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CourseId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for CourseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Role carried by an identity token.
///
/// There is no default: a token without a recognised role is rejected.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    Student,
    Instructor,
}

/// An authenticated caller, derived from a verified identity token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub id: UserId,
    pub email: String,
    pub role: Role,
}

impl Principal {
    pub fn is_instructor(&self) -> bool {
        self.role == Role::Instructor
    }
}

/// A registered account. The password hash never leaves the identity store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a user account.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

/// A course offered by an instructor. Prices are integer cents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: CourseId,
    pub title: String,
    pub description: Option<String>,
    pub price_cents: i64,
    pub instructor_id: UserId,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a course.
#[derive(Debug, Clone)]
pub struct NewCourse {
    pub title: String,
    pub description: Option<String>,
    pub price_cents: i64,
    pub instructor_id: UserId,
}

/// A downloadable file attached to a course, addressed by its object-storage key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Material {
    pub id: i64,
    pub course_id: CourseId,
    pub file_name: String,
    pub storage_key: String,
}

/// A durable grant of a user's access to a course's gated resources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entitlement {
    pub user_id: UserId,
    pub course_id: CourseId,
    pub created_at: DateTime<Utc>,
}

/// The live stream provisioned for a course. At most one per course.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveStreamRecord {
    pub course_id: CourseId,
    pub stream_id: String,
    pub playback_id: Option<String>,
    /// Provider-reported status (`idle`, `active`, `disconnected`, ...).
    pub status: String,
    /// Policy the stream was provisioned with.
    pub playback_policy: PlaybackPolicy,
}

impl LiveStreamRecord {
    pub fn is_active(&self) -> bool {
        self.status == "active"
    }
}

/// A payment ledger row, keyed by the provider's checkout session id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentRecord {
    pub session_id: String,
    pub user_id: UserId,
    pub course_id: CourseId,
    pub amount_cents: i64,
    /// ISO currency code, upper case.
    pub currency: String,
    pub status: String,
}

/// Outcome of an idempotent ledger insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerWrite {
    Inserted,
    Duplicate,
}

/// A verified notification that could not be applied, kept for out-of-band recovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconciliationFailure {
    pub event_id: String,
    pub event_type: String,
    pub error: String,
    pub payload: String,
}

/// What a signed credential grants access to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CredentialKind {
    /// A single object in the course-materials bucket.
    StorageObject,
    /// A live stream playback session.
    LivePlayback,
    /// Recorded video playback.
    VideoPlayback,
}

/// A short-lived credential handed to a client for direct access to an
/// external resource server. Never persisted and never revocable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedCredential {
    /// Storage key or playback id the credential is bound to.
    pub resource: String,
    pub kind: CredentialKind,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    /// The signature (storage URLs) or signed token (playback).
    pub token: String,
    /// The final URL the client should use.
    pub url: String,
}

impl SignedCredential {
    /// Credentials are accepted up to and including their expiry instant.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now <= self.expires_at
    }
}

/// Input for creating a hosted checkout session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutRequest {
    pub course_id: CourseId,
    pub user_id: UserId,
    pub course_title: String,
    pub unit_amount_cents: i64,
    pub currency: String,
    pub success_url: String,
    pub cancel_url: String,
}

/// A checkout session as reported by the payment provider.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CheckoutSession {
    pub id: String,
    pub url: Option<String>,
    pub payment_status: String,
    pub amount_total: Option<i64>,
    pub currency: Option<String>,
    pub metadata: BTreeMap<String, String>,
}

impl CheckoutSession {
    pub fn is_paid(&self) -> bool {
        self.payment_status == "paid"
    }
}

/// Playback policy requested when provisioning a live stream.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PlaybackPolicy {
    Signed,
    Public,
}

/// A live stream as reported by the video provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionedStream {
    pub stream_id: String,
    pub stream_key: String,
    pub playback_id: Option<String>,
    pub status: String,
}

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of adapter behind a trait object.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Storage,
    Payments,
    Video,
}
