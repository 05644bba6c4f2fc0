// SPDX-FileCopyrightText: 2026 Lectern Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the storage traits.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;

use lectern_config::model::StorageConfig;
use lectern_core::{
    AdapterType, Course, CourseCatalog, CourseId, EntitlementStore, HealthStatus, LecternError,
    LedgerWrite, LiveStreamRecord, LiveStreamStore, Material, MaterialStore, NewCourse, NewUser,
    PaymentLedger, PaymentRecord, PluginAdapter, ReconciliationFailure, StorageAdapter, User,
    UserId, UserStore,
};

use crate::database::Database;
use crate::queries;

/// SQLite-backed storage adapter.
///
/// Wraps a [`Database`] handle and delegates all query operations to the
/// typed query modules. The database is lazily initialized on the first
/// call to [`StorageAdapter::initialize`].
pub struct SqliteStorage {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    /// Create a new SqliteStorage with the given configuration.
    ///
    /// The database connection is not opened until [`StorageAdapter::initialize`] is called.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    /// Wrap an already-open database, e.g. an in-memory one in tests.
    pub fn from_database(config: StorageConfig, db: Database) -> Self {
        Self {
            config,
            db: OnceCell::new_with(Some(db)),
        }
    }

    /// Returns a reference to the underlying Database, or an error if not initialized.
    fn db(&self) -> Result<&Database, LecternError> {
        self.db.get().ok_or_else(|| LecternError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }

    async fn checkpoint(db: &Database) -> Result<(), LecternError> {
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(crate::database::map_tr_err)
    }
}

#[async_trait]
impl PluginAdapter for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, LecternError> {
        let db = self.db()?;
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(crate::database::map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), LecternError> {
        if let Some(db) = self.db.get() {
            Self::checkpoint(db).await?;
            debug!("shutdown: WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl StorageAdapter for SqliteStorage {
    async fn initialize(&self) -> Result<(), LecternError> {
        let db = Database::open(&self.config.database_path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| LecternError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), LecternError> {
        Self::checkpoint(self.db()?).await?;
        debug!("WAL checkpoint complete");
        Ok(())
    }
}

#[async_trait]
impl UserStore for SqliteStorage {
    async fn create_user(&self, user: NewUser) -> Result<User, LecternError> {
        queries::users::create_user(self.db()?, user).await
    }

    async fn find_user_by_email(
        &self,
        email: &str,
    ) -> Result<Option<(User, String)>, LecternError> {
        queries::users::find_user_by_email(self.db()?, email).await
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, LecternError> {
        queries::users::get_user(self.db()?, id).await
    }
}

#[async_trait]
impl CourseCatalog for SqliteStorage {
    async fn create_course(&self, course: NewCourse) -> Result<Course, LecternError> {
        queries::courses::create_course(self.db()?, course).await
    }

    async fn get_course(&self, id: CourseId) -> Result<Option<Course>, LecternError> {
        queries::courses::get_course(self.db()?, id).await
    }

    async fn list_courses(&self) -> Result<Vec<Course>, LecternError> {
        queries::courses::list_courses(self.db()?).await
    }

    async fn courses_by_ids(&self, ids: &[CourseId]) -> Result<Vec<Course>, LecternError> {
        queries::courses::courses_by_ids(self.db()?, ids).await
    }
}

#[async_trait]
impl EntitlementStore for SqliteStorage {
    async fn grant(&self, user: UserId, course: CourseId) -> Result<(), LecternError> {
        queries::entitlements::grant(self.db()?, user, course).await?;
        Ok(())
    }

    async fn is_entitled(&self, user: UserId, course: CourseId) -> Result<bool, LecternError> {
        queries::entitlements::is_entitled(self.db()?, user, course).await
    }

    async fn list_for_user(&self, user: UserId) -> Result<Vec<CourseId>, LecternError> {
        let rows = queries::entitlements::list_for_user(self.db()?, user).await?;
        Ok(rows.into_iter().map(|e| e.course_id).collect())
    }
}

#[async_trait]
impl MaterialStore for SqliteStorage {
    async fn add_material(
        &self,
        course: CourseId,
        file_name: &str,
        storage_key: &str,
    ) -> Result<Material, LecternError> {
        queries::materials::add_material(self.db()?, course, file_name, storage_key).await
    }

    async fn list_materials(&self, course: CourseId) -> Result<Vec<Material>, LecternError> {
        queries::materials::list_materials(self.db()?, course).await
    }
}

#[async_trait]
impl LiveStreamStore for SqliteStorage {
    async fn get_live_stream(
        &self,
        course: CourseId,
    ) -> Result<Option<LiveStreamRecord>, LecternError> {
        queries::live_streams::get_live_stream(self.db()?, course).await
    }

    async fn insert_live_stream(
        &self,
        record: LiveStreamRecord,
    ) -> Result<LiveStreamRecord, LecternError> {
        queries::live_streams::insert_live_stream(self.db()?, record).await
    }

    async fn update_status_by_stream_id(
        &self,
        stream_id: &str,
        status: &str,
    ) -> Result<bool, LecternError> {
        queries::live_streams::update_status_by_stream_id(self.db()?, stream_id, status).await
    }
}

#[async_trait]
impl PaymentLedger for SqliteStorage {
    async fn record_payment(&self, payment: PaymentRecord) -> Result<LedgerWrite, LecternError> {
        queries::payments::record_payment(self.db()?, payment).await
    }

    async fn get_payment(&self, session_id: &str) -> Result<Option<PaymentRecord>, LecternError> {
        queries::payments::get_payment(self.db()?, session_id).await
    }

    async fn record_failure(&self, failure: ReconciliationFailure) -> Result<(), LecternError> {
        queries::payments::record_failure(self.db()?, failure).await
    }

    async fn list_failures(&self) -> Result<Vec<ReconciliationFailure>, LecternError> {
        queries::payments::list_failures(self.db()?).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use lectern_core::{Role, Stores};
    use tempfile::tempdir;

    use super::*;

    fn make_config(path: &str) -> StorageConfig {
        StorageConfig {
            database_path: path.to_string(),
            wal_mode: true,
        }
    }

    #[tokio::test]
    async fn sqlite_storage_implements_plugin_adapter() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()));

        assert_eq!(storage.name(), "sqlite");
        assert_eq!(storage.version(), semver::Version::new(0, 1, 0));
        assert_eq!(storage.adapter_type(), AdapterType::Storage);
    }

    #[tokio::test]
    async fn initialize_twice_returns_error() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("double_init.db");
        let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()));

        storage.initialize().await.unwrap();
        assert!(db_path.exists(), "database file should be created");
        assert!(storage.initialize().await.is_err(), "second initialize should fail");
    }

    #[tokio::test]
    async fn health_check_requires_initialize() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("health.db");
        let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()));

        assert!(storage.health_check().await.is_err());
        storage.initialize().await.unwrap();
        assert_eq!(storage.health_check().await.unwrap(), HealthStatus::Healthy);
    }

    #[tokio::test]
    async fn purchase_flow_through_trait_objects() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("flow.db");
        let storage = Arc::new(SqliteStorage::new(make_config(db_path.to_str().unwrap())));
        storage.initialize().await.unwrap();
        let stores = Stores::from_shared(storage.clone());

        let instructor = stores
            .users
            .create_user(NewUser {
                name: "Ada".into(),
                email: "ada@example.com".into(),
                password_hash: "hash".into(),
                role: Role::Instructor,
            })
            .await
            .unwrap();
        let student = stores
            .users
            .create_user(NewUser {
                name: "Bo".into(),
                email: "bo@example.com".into(),
                password_hash: "hash".into(),
                role: Role::Student,
            })
            .await
            .unwrap();
        let course = stores
            .courses
            .create_course(NewCourse {
                title: "Rust".into(),
                description: None,
                price_cents: 1000,
                instructor_id: instructor.id,
            })
            .await
            .unwrap();

        stores.entitlements.grant(student.id, course.id).await.unwrap();
        stores.entitlements.grant(student.id, course.id).await.unwrap();

        assert!(stores.entitlements.is_entitled(student.id, course.id).await.unwrap());
        assert_eq!(
            stores.entitlements.list_for_user(student.id).await.unwrap(),
            vec![course.id]
        );

        storage.close().await.unwrap();
    }
}
