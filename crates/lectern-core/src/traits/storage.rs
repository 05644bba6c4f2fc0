// SPDX-FileCopyrightText: 2026 Lectern Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage traits: the backend lifecycle plus one trait per owned record type.
//!
//! Every method is an await point and fallible. Implementations never retry.

use async_trait::async_trait;

use crate::error::LecternError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{
    Course, CourseId, LedgerWrite, LiveStreamRecord, Material, NewCourse, NewUser, PaymentRecord,
    ReconciliationFailure, User, UserId,
};

/// Adapter for storage and persistence backends.
#[async_trait]
pub trait StorageAdapter: PluginAdapter {
    /// Initializes the storage backend (migrations, connection, pragmas).
    async fn initialize(&self) -> Result<(), LecternError>;

    /// Closes the storage backend, flushing pending writes and releasing connections.
    async fn close(&self) -> Result<(), LecternError>;
}

/// Account records and their password hashes.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Creates an account. A taken email yields [`LecternError::Conflict`].
    async fn create_user(&self, user: NewUser) -> Result<User, LecternError>;

    /// Looks up an account and its stored password hash by email.
    async fn find_user_by_email(&self, email: &str)
    -> Result<Option<(User, String)>, LecternError>;

    async fn get_user(&self, id: UserId) -> Result<Option<User>, LecternError>;
}

/// Read access to courses, plus creation for the instructor API.
#[async_trait]
pub trait CourseCatalog: Send + Sync {
    async fn create_course(&self, course: NewCourse) -> Result<Course, LecternError>;

    async fn get_course(&self, id: CourseId) -> Result<Option<Course>, LecternError>;

    /// All courses, newest first.
    async fn list_courses(&self) -> Result<Vec<Course>, LecternError>;

    /// The subset of `ids` that exist, in no particular order.
    async fn courses_by_ids(&self, ids: &[CourseId]) -> Result<Vec<Course>, LecternError>;
}

/// Durable (user, course) access grants.
#[async_trait]
pub trait EntitlementStore: Send + Sync {
    /// Grants access. Granting an existing pair succeeds without a second row.
    async fn grant(&self, user: UserId, course: CourseId) -> Result<(), LecternError>;

    async fn is_entitled(&self, user: UserId, course: CourseId) -> Result<bool, LecternError>;

    /// Course ids the user is entitled to, order unspecified.
    async fn list_for_user(&self, user: UserId) -> Result<Vec<CourseId>, LecternError>;
}

/// Course materials stored in object storage.
#[async_trait]
pub trait MaterialStore: Send + Sync {
    async fn add_material(
        &self,
        course: CourseId,
        file_name: &str,
        storage_key: &str,
    ) -> Result<Material, LecternError>;

    async fn list_materials(&self, course: CourseId) -> Result<Vec<Material>, LecternError>;
}

/// Per-course live stream records.
#[async_trait]
pub trait LiveStreamStore: Send + Sync {
    async fn get_live_stream(
        &self,
        course: CourseId,
    ) -> Result<Option<LiveStreamRecord>, LecternError>;

    /// Inserts the record unless the course already has one, and returns the
    /// stored record either way.
    async fn insert_live_stream(
        &self,
        record: LiveStreamRecord,
    ) -> Result<LiveStreamRecord, LecternError>;

    /// Updates the status of the record with the given provider stream id.
    /// Returns false when no record matches.
    async fn update_status_by_stream_id(
        &self,
        stream_id: &str,
        status: &str,
    ) -> Result<bool, LecternError>;
}

/// The payment ledger and its dead-letter table.
#[async_trait]
pub trait PaymentLedger: Send + Sync {
    /// Inserts a payment keyed by session id. An existing key is a
    /// [`LedgerWrite::Duplicate`], not an error.
    async fn record_payment(&self, payment: PaymentRecord) -> Result<LedgerWrite, LecternError>;

    async fn get_payment(&self, session_id: &str) -> Result<Option<PaymentRecord>, LecternError>;

    /// Appends a verified-but-unapplied notification to the dead-letter table.
    async fn record_failure(&self, failure: ReconciliationFailure) -> Result<(), LecternError>;

    /// Dead-lettered notifications, oldest first.
    async fn list_failures(&self) -> Result<Vec<ReconciliationFailure>, LecternError>;
}
