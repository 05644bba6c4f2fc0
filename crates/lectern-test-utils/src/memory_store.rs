// SPDX-FileCopyrightText: 2026 Lectern Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory implementation of every store trait.
//!
//! Enforces the same rules as the SQLite backend: one account per email, one
//! entitlement per (user, course), one live stream per course, one ledger row
//! per checkout session, and no row naming a user or course that does not
//! exist.

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use lectern_core::{
    Course, CourseCatalog, CourseId, EntitlementStore, LecternError, LedgerWrite,
    LiveStreamRecord, LiveStreamStore, Material, MaterialStore, NewCourse, NewUser,
    PaymentLedger, PaymentRecord, ReconciliationFailure, User, UserId, UserStore,
};

#[derive(Default)]
struct State {
    users: Vec<(User, String)>,
    courses: Vec<Course>,
    entitlements: BTreeSet<(UserId, CourseId)>,
    materials: Vec<Material>,
    live_streams: HashMap<CourseId, LiveStreamRecord>,
    payments: HashMap<String, PaymentRecord>,
    failures: Vec<ReconciliationFailure>,
}

impl State {
    /// Reject a write naming a user or course that does not exist, with the
    /// same error kind the SQLite foreign keys produce.
    fn check_refs(&self, user: Option<UserId>, course: Option<CourseId>) -> Result<(), LecternError> {
        if let Some(user) = user.filter(|id| !self.users.iter().any(|(u, _)| u.id == *id)) {
            return Err(missing_reference(format!("user {user}")));
        }
        if let Some(course) = course.filter(|id| !self.courses.iter().any(|c| c.id == *id)) {
            return Err(missing_reference(format!("course {course}")));
        }
        Ok(())
    }
}

fn missing_reference(what: String) -> LecternError {
    LecternError::Storage {
        source: format!("FOREIGN KEY constraint failed: no {what}").into(),
    }
}

/// A store backed by process memory. Every handle is independent.
#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entitlement rows.
    pub async fn entitlement_count(&self) -> usize {
        self.state.lock().await.entitlements.len()
    }

    /// Number of stored ledger rows.
    pub async fn payment_count(&self) -> usize {
        self.state.lock().await.payments.len()
    }
}

#[async_trait]
impl UserStore for InMemoryStore {
    async fn create_user(&self, user: NewUser) -> Result<User, LecternError> {
        let mut state = self.state.lock().await;
        if state.users.iter().any(|(u, _)| u.email == user.email) {
            return Err(LecternError::Conflict(format!(
                "user {} already exists",
                user.email
            )));
        }
        let created = User {
            id: UserId(state.users.len() as i64 + 1),
            name: user.name,
            email: user.email,
            role: user.role,
            created_at: Utc::now(),
        };
        state.users.push((created.clone(), user.password_hash));
        Ok(created)
    }

    async fn find_user_by_email(
        &self,
        email: &str,
    ) -> Result<Option<(User, String)>, LecternError> {
        let state = self.state.lock().await;
        Ok(state.users.iter().find(|(u, _)| u.email == email).cloned())
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, LecternError> {
        let state = self.state.lock().await;
        Ok(state
            .users
            .iter()
            .find(|(u, _)| u.id == id)
            .map(|(u, _)| u.clone()))
    }
}

#[async_trait]
impl CourseCatalog for InMemoryStore {
    async fn create_course(&self, course: NewCourse) -> Result<Course, LecternError> {
        let mut state = self.state.lock().await;
        state.check_refs(Some(course.instructor_id), None)?;
        let created = Course {
            id: CourseId(state.courses.len() as i64 + 1),
            title: course.title,
            description: course.description,
            price_cents: course.price_cents,
            instructor_id: course.instructor_id,
            created_at: Utc::now(),
        };
        state.courses.push(created.clone());
        Ok(created)
    }

    async fn get_course(&self, id: CourseId) -> Result<Option<Course>, LecternError> {
        let state = self.state.lock().await;
        Ok(state.courses.iter().find(|c| c.id == id).cloned())
    }

    async fn list_courses(&self) -> Result<Vec<Course>, LecternError> {
        let state = self.state.lock().await;
        let mut courses = state.courses.clone();
        courses.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(courses)
    }

    async fn courses_by_ids(&self, ids: &[CourseId]) -> Result<Vec<Course>, LecternError> {
        let state = self.state.lock().await;
        Ok(state
            .courses
            .iter()
            .filter(|c| ids.contains(&c.id))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl EntitlementStore for InMemoryStore {
    async fn grant(&self, user: UserId, course: CourseId) -> Result<(), LecternError> {
        let mut state = self.state.lock().await;
        state.check_refs(Some(user), Some(course))?;
        state.entitlements.insert((user, course));
        Ok(())
    }

    async fn is_entitled(&self, user: UserId, course: CourseId) -> Result<bool, LecternError> {
        Ok(self.state.lock().await.entitlements.contains(&(user, course)))
    }

    async fn list_for_user(&self, user: UserId) -> Result<Vec<CourseId>, LecternError> {
        let state = self.state.lock().await;
        Ok(state
            .entitlements
            .iter()
            .filter(|(u, _)| *u == user)
            .map(|(_, c)| *c)
            .collect())
    }
}

#[async_trait]
impl MaterialStore for InMemoryStore {
    async fn add_material(
        &self,
        course: CourseId,
        file_name: &str,
        storage_key: &str,
    ) -> Result<Material, LecternError> {
        let mut state = self.state.lock().await;
        state.check_refs(None, Some(course))?;
        let material = Material {
            id: state.materials.len() as i64 + 1,
            course_id: course,
            file_name: file_name.to_string(),
            storage_key: storage_key.to_string(),
        };
        state.materials.push(material.clone());
        Ok(material)
    }

    async fn list_materials(&self, course: CourseId) -> Result<Vec<Material>, LecternError> {
        let state = self.state.lock().await;
        Ok(state
            .materials
            .iter()
            .filter(|m| m.course_id == course)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl LiveStreamStore for InMemoryStore {
    async fn get_live_stream(
        &self,
        course: CourseId,
    ) -> Result<Option<LiveStreamRecord>, LecternError> {
        Ok(self.state.lock().await.live_streams.get(&course).cloned())
    }

    async fn insert_live_stream(
        &self,
        record: LiveStreamRecord,
    ) -> Result<LiveStreamRecord, LecternError> {
        let mut state = self.state.lock().await;
        state.check_refs(None, Some(record.course_id))?;
        Ok(state
            .live_streams
            .entry(record.course_id)
            .or_insert(record)
            .clone())
    }

    async fn update_status_by_stream_id(
        &self,
        stream_id: &str,
        status: &str,
    ) -> Result<bool, LecternError> {
        let mut state = self.state.lock().await;
        match state
            .live_streams
            .values_mut()
            .find(|r| r.stream_id == stream_id)
        {
            Some(record) => {
                record.status = status.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl PaymentLedger for InMemoryStore {
    async fn record_payment(&self, payment: PaymentRecord) -> Result<LedgerWrite, LecternError> {
        let mut state = self.state.lock().await;
        state.check_refs(Some(payment.user_id), Some(payment.course_id))?;
        if state.payments.contains_key(&payment.session_id) {
            return Ok(LedgerWrite::Duplicate);
        }
        state.payments.insert(payment.session_id.clone(), payment);
        Ok(LedgerWrite::Inserted)
    }

    async fn get_payment(&self, session_id: &str) -> Result<Option<PaymentRecord>, LecternError> {
        Ok(self.state.lock().await.payments.get(session_id).cloned())
    }

    async fn record_failure(&self, failure: ReconciliationFailure) -> Result<(), LecternError> {
        self.state.lock().await.failures.push(failure);
        Ok(())
    }

    async fn list_failures(&self) -> Result<Vec<ReconciliationFailure>, LecternError> {
        Ok(self.state.lock().await.failures.clone())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use lectern_core::{PlaybackPolicy, Role};

    use super::*;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            name: "Ada".into(),
            email: email.into(),
            password_hash: "hash".into(),
            role: Role::Student,
        }
    }

    /// A store holding one student and one course.
    async fn seeded() -> (InMemoryStore, UserId, CourseId) {
        let store = InMemoryStore::new();
        let student = store.create_user(new_user("ada@example.com")).await.unwrap();
        let course = store
            .create_course(NewCourse {
                title: "Systems Programming".into(),
                description: None,
                price_cents: 4900,
                instructor_id: student.id,
            })
            .await
            .unwrap();
        (store, student.id, course.id)
    }

    #[tokio::test]
    async fn duplicate_email_is_a_conflict() {
        let store = InMemoryStore::new();
        store.create_user(new_user("ada@example.com")).await.unwrap();
        let err = store
            .create_user(new_user("ada@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, LecternError::Conflict(_)));
    }

    #[tokio::test]
    async fn concurrent_grants_leave_one_row() {
        let (store, user, course) = seeded().await;
        let store = Arc::new(store);
        let mut tasks = Vec::new();
        for _ in 0..16 {
            let store = store.clone();
            tasks.push(tokio::spawn(async move { store.grant(user, course).await }));
        }
        for task in tasks {
            task.await.unwrap().unwrap();
        }
        assert_eq!(store.entitlement_count().await, 1);
        assert_eq!(store.list_for_user(user).await.unwrap(), vec![course]);
    }

    #[tokio::test]
    async fn grant_for_unknown_user_or_course_is_rejected() {
        let (store, user, course) = seeded().await;

        let err = store.grant(UserId(99), course).await.unwrap_err();
        assert!(matches!(err, LecternError::Storage { .. }));
        let err = store.grant(user, CourseId(99)).await.unwrap_err();
        assert!(matches!(err, LecternError::Storage { .. }));
        assert!(store.grant(UserId(99), CourseId(99)).await.is_err());

        assert_eq!(store.entitlement_count().await, 0);
        assert!(!store.is_entitled(UserId(99), course).await.unwrap());
    }

    #[tokio::test]
    async fn writes_naming_unknown_course_are_rejected() {
        let store = InMemoryStore::new();
        assert!(store.add_material(CourseId(7), "a.pdf", "k").await.is_err());
        let record = LiveStreamRecord {
            course_id: CourseId(7),
            stream_id: "ls_a".into(),
            playback_id: None,
            status: "idle".into(),
            playback_policy: PlaybackPolicy::Public,
        };
        assert!(store.insert_live_stream(record).await.is_err());
        assert!(store.get_live_stream(CourseId(7)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn second_live_stream_insert_returns_first() {
        let (store, _, course) = seeded().await;
        let record = |id: &str| LiveStreamRecord {
            course_id: course,
            stream_id: id.into(),
            playback_id: Some("pb".into()),
            status: "idle".into(),
            playback_policy: PlaybackPolicy::Signed,
        };
        store.insert_live_stream(record("ls_a")).await.unwrap();
        let stored = store.insert_live_stream(record("ls_b")).await.unwrap();
        assert_eq!(stored.stream_id, "ls_a");

        assert!(store.update_status_by_stream_id("ls_a", "active").await.unwrap());
        assert!(!store.update_status_by_stream_id("ls_b", "active").await.unwrap());
    }

    #[tokio::test]
    async fn ledger_keys_on_session_id() {
        let (store, user, course) = seeded().await;
        let payment = PaymentRecord {
            session_id: "cs_1".into(),
            user_id: user,
            course_id: course,
            amount_cents: 4900,
            currency: "USD".into(),
            status: "paid".into(),
        };
        assert_eq!(
            store.record_payment(payment.clone()).await.unwrap(),
            LedgerWrite::Inserted
        );
        assert_eq!(
            store.record_payment(payment).await.unwrap(),
            LedgerWrite::Duplicate
        );
        assert_eq!(store.payment_count().await, 1);

        let orphan = PaymentRecord {
            session_id: "cs_2".into(),
            user_id: UserId(99),
            ..payment_for(user, course)
        };
        assert!(store.record_payment(orphan).await.is_err());
        assert_eq!(store.payment_count().await, 1);
    }

    fn payment_for(user: UserId, course: CourseId) -> PaymentRecord {
        PaymentRecord {
            session_id: "cs".into(),
            user_id: user,
            course_id: course,
            amount_cents: 4900,
            currency: "USD".into(),
            status: "paid".into(),
        }
    }
}
