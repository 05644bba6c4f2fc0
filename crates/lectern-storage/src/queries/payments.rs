// SPDX-FileCopyrightText: 2026 Lectern Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Payment ledger and reconciliation dead-letter queries.

use lectern_core::{
    CourseId, LecternError, LedgerWrite, PaymentRecord, ReconciliationFailure, UserId,
};
use rusqlite::{params, OptionalExtension};

use crate::database::{map_tr_err, Database};

/// Insert a payment keyed by provider session id. A second insert for the same
/// session is reported as [`LedgerWrite::Duplicate`] and leaves the first row intact.
pub async fn record_payment(
    db: &Database,
    payment: PaymentRecord,
) -> Result<LedgerWrite, LecternError> {
    let inserted = db
        .connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO payments (session_id, user_id, course_id, amount_cents, currency, status)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(session_id) DO NOTHING",
                params![
                    payment.session_id,
                    payment.user_id.0,
                    payment.course_id.0,
                    payment.amount_cents,
                    payment.currency,
                    payment.status,
                ],
            )
        })
        .await
        .map_err(map_tr_err)?;

    Ok(if inserted > 0 {
        LedgerWrite::Inserted
    } else {
        LedgerWrite::Duplicate
    })
}

pub async fn get_payment(
    db: &Database,
    session_id: &str,
) -> Result<Option<PaymentRecord>, LecternError> {
    let session_id = session_id.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT session_id, user_id, course_id, amount_cents, currency, status
                 FROM payments WHERE session_id = ?1",
                params![session_id],
                |row| {
                    Ok(PaymentRecord {
                        session_id: row.get(0)?,
                        user_id: UserId(row.get(1)?),
                        course_id: CourseId(row.get(2)?),
                        amount_cents: row.get(3)?,
                        currency: row.get(4)?,
                        status: row.get(5)?,
                    })
                },
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

pub async fn record_failure(
    db: &Database,
    failure: ReconciliationFailure,
) -> Result<(), LecternError> {
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO reconciliation_failures (event_id, event_type, error, payload)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    failure.event_id,
                    failure.event_type,
                    failure.error,
                    failure.payload
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Dead-lettered notifications, oldest first.
pub async fn list_failures(db: &Database) -> Result<Vec<ReconciliationFailure>, LecternError> {
    db.connection()
        .call(|conn| {
            let mut stmt = conn.prepare(
                "SELECT event_id, event_type, error, payload
                 FROM reconciliation_failures ORDER BY id",
            )?;
            let rows = stmt.query_map([], |row| {
                Ok(ReconciliationFailure {
                    event_id: row.get(0)?,
                    event_type: row.get(1)?,
                    error: row.get(2)?,
                    payload: row.get(3)?,
                })
            })?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use lectern_core::Role;

    use super::*;
    use crate::test_support::{seed_course, seed_user};

    fn payment(session: &str, user: UserId, course: CourseId) -> PaymentRecord {
        PaymentRecord {
            session_id: session.into(),
            user_id: user,
            course_id: course,
            amount_cents: 4900,
            currency: "USD".into(),
            status: "paid".into(),
        }
    }

    #[tokio::test]
    async fn duplicate_session_is_reported_not_rejected() {
        let db = Database::open_in_memory().await.unwrap();
        let instructor = seed_user(&db, "teach@example.com", Role::Instructor).await;
        let student = seed_user(&db, "learn@example.com", Role::Student).await;
        let course = seed_course(&db, instructor.id).await;

        let first = record_payment(&db, payment("cs_1", student.id, course.id))
            .await
            .unwrap();
        let mut replay = payment("cs_1", student.id, course.id);
        replay.amount_cents = 1;
        let second = record_payment(&db, replay).await.unwrap();

        assert_eq!(first, LedgerWrite::Inserted);
        assert_eq!(second, LedgerWrite::Duplicate);
        let stored = get_payment(&db, "cs_1").await.unwrap().unwrap();
        assert_eq!(stored.amount_cents, 4900, "first write wins");
    }

    #[tokio::test]
    async fn unknown_session_is_none() {
        let db = Database::open_in_memory().await.unwrap();
        assert!(get_payment(&db, "cs_missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn failures_are_appended() {
        let db = Database::open_in_memory().await.unwrap();
        for n in 0..2 {
            record_failure(
                &db,
                ReconciliationFailure {
                    event_id: format!("evt_{n}"),
                    event_type: "checkout.session.completed".into(),
                    error: "metadata.userId missing".into(),
                    payload: "{}".into(),
                },
            )
            .await
            .unwrap();
        }
        let failures = list_failures(&db).await.unwrap();
        assert_eq!(failures.len(), 2);
        assert_eq!(failures[0].event_id, "evt_0");
    }
}
