// SPDX-FileCopyrightText: 2026 Lectern Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Turns verified payment notifications into entitlements.
//!
//! A notification moves `Received -> Verified -> Applied`, or stops at
//! `Rejected` (bad signature, reported to the caller) or `Duplicate` (the
//! session is already in the ledger). The entitlement is granted before the
//! ledger row is written, so a redelivery after a crash between the two writes
//! still converges.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use lectern_auth::{SignatureError, WebhookVerifier};
use lectern_core::{
    CheckoutSession, CourseId, EntitlementStore, LecternError, LedgerWrite, PaymentLedger,
    PaymentRecord, ReconciliationFailure, Stores, UserId,
};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::events::{PaymentEvent, parse_event};

/// What happened to a notification or session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Entitlement granted and ledger row written.
    Applied {
        session_id: String,
        user: UserId,
        course: CourseId,
    },
    /// The session was already in the ledger.
    Duplicate { session_id: String },
    /// Nothing to do: unpaid session or an event type we do not act on.
    Ignored { reason: String },
    /// Verified but not applicable. Acknowledged and dead-lettered.
    Failed { event_id: String },
}

#[derive(Debug, Error)]
pub enum ReconciliationError {
    /// The signature check failed. Nothing was read or written.
    #[error("notification rejected: {0}")]
    Rejected(#[from] SignatureError),

    /// The session metadata does not name a user and course.
    #[error("invalid checkout metadata: {0}")]
    InvalidMetadata(String),

    #[error(transparent)]
    Store(#[from] LecternError),
}

/// Applies payment notifications and verified sessions to the entitlement store.
pub struct ReconciliationListener {
    verifier: WebhookVerifier,
    entitlements: Arc<dyn EntitlementStore>,
    ledger: Arc<dyn PaymentLedger>,
}

impl ReconciliationListener {
    pub fn new(
        verifier: WebhookVerifier,
        entitlements: Arc<dyn EntitlementStore>,
        ledger: Arc<dyn PaymentLedger>,
    ) -> Self {
        Self {
            verifier,
            entitlements,
            ledger,
        }
    }

    pub fn from_stores(verifier: WebhookVerifier, stores: &Stores) -> Self {
        Self::new(verifier, stores.entitlements.clone(), stores.payments.clone())
    }

    /// Handle a raw notification body and its signature header.
    pub async fn handle(
        &self,
        raw: &[u8],
        signature_header: &str,
    ) -> Result<ReconcileOutcome, ReconciliationError> {
        self.handle_at(raw, signature_header, Utc::now()).await
    }

    /// Like [`handle`](Self::handle) with an explicit clock for the
    /// signature timestamp check.
    ///
    /// Only a signature failure is returned as an error. Everything after
    /// verification resolves to an outcome the caller acknowledges.
    pub async fn handle_at(
        &self,
        raw: &[u8],
        signature_header: &str,
        now: DateTime<Utc>,
    ) -> Result<ReconcileOutcome, ReconciliationError> {
        if let Err(e) = self.verifier.verify_at(raw, signature_header, now) {
            warn!(error = %e, "payment notification rejected");
            return Err(e.into());
        }

        let event = match parse_event(raw) {
            Ok(event) => event,
            Err(e) => return Ok(self.dead_letter("unknown", "unknown", e.to_string(), raw).await),
        };

        match event {
            PaymentEvent::Other {
                event_id,
                event_type,
            } => {
                info!(%event_id, %event_type, "payment notification ignored");
                Ok(ReconcileOutcome::Ignored {
                    reason: format!("unhandled event type {event_type}"),
                })
            }
            PaymentEvent::CheckoutSettled {
                event_id,
                event_type,
                session,
            } => match self.apply(&session).await {
                Ok(outcome) => Ok(outcome),
                Err(e) => Ok(self.dead_letter(&event_id, &event_type, e.to_string(), raw).await),
            },
        }
    }

    /// Apply a session fetched directly from the provider, without a
    /// signature. Errors are returned rather than dead-lettered.
    pub async fn reconcile_session(
        &self,
        session: &CheckoutSession,
    ) -> Result<ReconcileOutcome, ReconciliationError> {
        self.apply(session).await
    }

    async fn apply(
        &self,
        session: &CheckoutSession,
    ) -> Result<ReconcileOutcome, ReconciliationError> {
        if !session.is_paid() {
            info!(session_id = %session.id, status = %session.payment_status, "session not paid");
            return Ok(ReconcileOutcome::Ignored {
                reason: format!("payment status {}", session.payment_status),
            });
        }

        let (user, course) = checkout_metadata(session)?;
        self.entitlements.grant(user, course).await?;

        let record = PaymentRecord {
            session_id: session.id.clone(),
            user_id: user,
            course_id: course,
            amount_cents: session.amount_total.unwrap_or(0),
            currency: session
                .currency
                .as_deref()
                .unwrap_or("usd")
                .to_uppercase(),
            status: session.payment_status.clone(),
        };
        match self.ledger.record_payment(record).await? {
            LedgerWrite::Inserted => {
                info!(session_id = %session.id, %user, %course, "entitlement granted");
                Ok(ReconcileOutcome::Applied {
                    session_id: session.id.clone(),
                    user,
                    course,
                })
            }
            LedgerWrite::Duplicate => {
                info!(session_id = %session.id, "duplicate payment notification");
                Ok(ReconcileOutcome::Duplicate {
                    session_id: session.id.clone(),
                })
            }
        }
    }

    async fn dead_letter(
        &self,
        event_id: &str,
        event_type: &str,
        reason: String,
        raw: &[u8],
    ) -> ReconcileOutcome {
        error!(
            event_id,
            event_type,
            error = %reason,
            "payment notification acknowledged but not applied"
        );
        let failure = ReconciliationFailure {
            event_id: event_id.to_string(),
            event_type: event_type.to_string(),
            error: reason,
            payload: String::from_utf8_lossy(raw).into_owned(),
        };
        if let Err(e) = self.ledger.record_failure(failure).await {
            error!(event_id, error = %e, "failed to record reconciliation failure");
        }
        ReconcileOutcome::Failed {
            event_id: event_id.to_string(),
        }
    }
}

/// Extract the purchasing user and course from session metadata.
pub fn checkout_metadata(
    session: &CheckoutSession,
) -> Result<(UserId, CourseId), ReconciliationError> {
    let field = |name: &str| -> Result<i64, ReconciliationError> {
        let raw = session.metadata.get(name).ok_or_else(|| {
            ReconciliationError::InvalidMetadata(format!("{name} missing on session {}", session.id))
        })?;
        raw.trim()
            .parse::<i64>()
            .ok()
            .filter(|id| *id > 0)
            .ok_or_else(|| {
                ReconciliationError::InvalidMetadata(format!(
                    "{name} `{raw}` on session {} is not a positive id",
                    session.id
                ))
            })
    };
    Ok((UserId(field("userId")?), CourseId(field("courseId")?)))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use lectern_config::model::StorageConfig;
    use lectern_core::{NewCourse, NewUser, Role};
    use lectern_storage::{Database, SqliteStorage};
    use secrecy::SecretString;
    use tracing_test::traced_test;

    use super::*;

    const SECRET: &str = "whsec_test";

    struct Fixture {
        stores: Stores,
        listener: ReconciliationListener,
        student: UserId,
        course: CourseId,
    }

    async fn fixture() -> Fixture {
        let db = Database::open_in_memory().await.unwrap();
        let storage = Arc::new(SqliteStorage::from_database(StorageConfig::default(), db));
        let stores = Stores::from_shared(storage);

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
                title: "Systems Programming".into(),
                description: None,
                price_cents: 4900,
                instructor_id: instructor.id,
            })
            .await
            .unwrap();

        let verifier = WebhookVerifier::new(SecretString::from(SECRET.to_string()), 300);
        let listener = ReconciliationListener::from_stores(verifier, &stores);
        Fixture {
            stores,
            listener,
            student: student.id,
            course: course.id,
        }
    }

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    fn event(event_id: &str, session_id: &str, user: &str, course: &str, status: &str) -> Vec<u8> {
        serde_json::to_vec(&serde_json::json!({
            "id": event_id,
            "type": "checkout.session.completed",
            "data": {"object": {
                "id": session_id,
                "payment_status": status,
                "amount_total": 4900,
                "currency": "usd",
                "metadata": {"courseId": course, "userId": user}
            }}
        }))
        .unwrap()
    }

    fn sign(raw: &[u8]) -> String {
        WebhookVerifier::new(SecretString::from(SECRET.to_string()), 300)
            .sign(raw, now().timestamp())
            .unwrap()
    }

    #[tokio::test]
    async fn paid_checkout_grants_entitlement_and_records_payment() {
        let f = fixture().await;
        let raw = event("evt_1", "cs_1", &f.student.to_string(), &f.course.to_string(), "paid");

        let outcome = f.listener.handle_at(&raw, &sign(&raw), now()).await.unwrap();
        assert_eq!(
            outcome,
            ReconcileOutcome::Applied {
                session_id: "cs_1".into(),
                user: f.student,
                course: f.course,
            }
        );
        assert!(f.stores.entitlements.is_entitled(f.student, f.course).await.unwrap());

        let payment = f.stores.payments.get_payment("cs_1").await.unwrap().unwrap();
        assert_eq!(payment.amount_cents, 4900);
        assert_eq!(payment.currency, "USD");
    }

    #[tokio::test]
    async fn duplicate_delivery_is_idempotent() {
        let f = fixture().await;
        let raw = event("evt_1", "cs_1", &f.student.to_string(), &f.course.to_string(), "paid");

        let first = f.listener.handle_at(&raw, &sign(&raw), now()).await.unwrap();
        let second = f.listener.handle_at(&raw, &sign(&raw), now()).await.unwrap();
        assert!(matches!(first, ReconcileOutcome::Applied { .. }));
        assert_eq!(
            second,
            ReconcileOutcome::Duplicate {
                session_id: "cs_1".into()
            }
        );
        assert_eq!(
            f.stores.entitlements.list_for_user(f.student).await.unwrap(),
            vec![f.course]
        );
    }

    #[tokio::test]
    async fn redelivery_after_ledger_loss_is_duplicate_free() {
        // Entitlement already present, ledger row missing: the retry writes the ledger.
        let f = fixture().await;
        f.stores.entitlements.grant(f.student, f.course).await.unwrap();
        let raw = event("evt_9", "cs_9", &f.student.to_string(), &f.course.to_string(), "paid");

        let outcome = f.listener.handle_at(&raw, &sign(&raw), now()).await.unwrap();
        assert!(matches!(outcome, ReconcileOutcome::Applied { .. }));
        assert!(f.stores.payments.get_payment("cs_9").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn tampered_signature_is_rejected_without_writes() {
        let f = fixture().await;
        let raw = event("evt_1", "cs_1", &f.student.to_string(), &f.course.to_string(), "paid");
        let forged = WebhookVerifier::new(SecretString::from("whsec_attacker".to_string()), 300)
            .sign(&raw, now().timestamp())
            .unwrap();

        let err = f.listener.handle_at(&raw, &forged, now()).await.unwrap_err();
        assert!(matches!(
            err,
            ReconciliationError::Rejected(SignatureError::Mismatch)
        ));
        assert!(!f.stores.entitlements.is_entitled(f.student, f.course).await.unwrap());
        assert!(f.stores.payments.get_payment("cs_1").await.unwrap().is_none());
        assert!(f.stores.payments.list_failures().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unpaid_session_is_ignored() {
        let f = fixture().await;
        let raw = event("evt_1", "cs_1", &f.student.to_string(), &f.course.to_string(), "unpaid");
        let outcome = f.listener.handle_at(&raw, &sign(&raw), now()).await.unwrap();
        assert!(matches!(outcome, ReconcileOutcome::Ignored { .. }));
        assert!(!f.stores.entitlements.is_entitled(f.student, f.course).await.unwrap());
    }

    #[tokio::test]
    async fn unrelated_event_types_are_ignored() {
        let f = fixture().await;
        let raw = br#"{"id":"evt_5","type":"customer.created","data":{"object":{"id":"cus_1"}}}"#;
        let outcome = f.listener.handle_at(raw, &sign(raw), now()).await.unwrap();
        assert_eq!(
            outcome,
            ReconcileOutcome::Ignored {
                reason: "unhandled event type customer.created".into()
            }
        );
    }

    #[tokio::test]
    #[traced_test]
    async fn missing_metadata_is_acked_logged_and_dead_lettered() {
        let f = fixture().await;
        let raw = event("evt_7", "cs_7", "", &f.course.to_string(), "paid");

        let outcome = f.listener.handle_at(&raw, &sign(&raw), now()).await.unwrap();
        assert_eq!(
            outcome,
            ReconcileOutcome::Failed {
                event_id: "evt_7".into()
            }
        );
        assert!(logs_contain("payment notification acknowledged but not applied"));

        let failures = f.stores.payments.list_failures().await.unwrap();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].event_id, "evt_7");
        assert_eq!(failures[0].event_type, "checkout.session.completed");
        assert!(failures[0].error.contains("userId"));
        assert_eq!(failures[0].payload.as_bytes(), raw.as_slice());
    }

    #[tokio::test]
    #[traced_test]
    async fn unknown_course_is_dead_lettered() {
        let f = fixture().await;
        let raw = event("evt_8", "cs_8", &f.student.to_string(), "999", "paid");

        let outcome = f.listener.handle_at(&raw, &sign(&raw), now()).await.unwrap();
        assert!(matches!(outcome, ReconcileOutcome::Failed { .. }));
        assert!(logs_contain("evt_8"));
        assert!(f.stores.payments.get_payment("cs_8").await.unwrap().is_none());
        assert_eq!(f.stores.payments.list_failures().await.unwrap().len(), 1);
    }

    #[tokio::test]
    #[traced_test]
    async fn unparseable_verified_body_is_dead_lettered() {
        let f = fixture().await;
        let raw = b"{not json";
        let outcome = f.listener.handle_at(raw, &sign(raw), now()).await.unwrap();
        assert_eq!(
            outcome,
            ReconcileOutcome::Failed {
                event_id: "unknown".into()
            }
        );
        assert!(logs_contain("not a valid event"));
    }

    #[tokio::test]
    async fn reconcile_session_applies_without_signature() {
        let f = fixture().await;
        let session = CheckoutSession {
            id: "cs_direct".into(),
            url: None,
            payment_status: "paid".into(),
            amount_total: Some(4900),
            currency: Some("eur".into()),
            metadata: BTreeMap::from([
                ("userId".to_string(), f.student.to_string()),
                ("courseId".to_string(), f.course.to_string()),
            ]),
        };

        let outcome = f.listener.reconcile_session(&session).await.unwrap();
        assert!(matches!(outcome, ReconcileOutcome::Applied { .. }));
        let again = f.listener.reconcile_session(&session).await.unwrap();
        assert!(matches!(again, ReconcileOutcome::Duplicate { .. }));
        assert_eq!(
            f.stores.payments.get_payment("cs_direct").await.unwrap().unwrap().currency,
            "EUR"
        );
    }

    #[test]
    fn metadata_must_be_positive_ids() {
        let session = |user: &str, course: &str| CheckoutSession {
            id: "cs".into(),
            metadata: BTreeMap::from([
                ("userId".to_string(), user.to_string()),
                ("courseId".to_string(), course.to_string()),
            ]),
            ..CheckoutSession::default()
        };
        assert_eq!(
            checkout_metadata(&session("2", "7")).unwrap(),
            (UserId(2), CourseId(7))
        );
        for (user, course) in [("0", "7"), ("2", "-1"), ("two", "7"), ("2", "")] {
            assert!(matches!(
                checkout_metadata(&session(user, course)),
                Err(ReconciliationError::InvalidMetadata(_))
            ));
        }
    }

    fn assert_send<T: Send>(_: T) {}

    #[tokio::test]
    async fn notification_futures_are_send() {
        let f = fixture().await;
        let session = CheckoutSession::default();
        assert_send(f.listener.handle(b"", ""));
        assert_send(f.listener.handle_at(b"{}", "t=1,v1=00", now()));
        assert_send(f.listener.reconcile_session(&session));
    }
}
