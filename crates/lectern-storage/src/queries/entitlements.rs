// SPDX-FileCopyrightText: 2026 Lectern Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Entitlement grants.
//!
//! `grant` is an upsert against UNIQUE(user_id, course_id): concurrent or
//! repeated grants for one pair converge on a single row without an error.

use lectern_core::{CourseId, Entitlement, LecternError, UserId};
use rusqlite::params;
use tracing::debug;

use crate::database::{map_tr_err, timestamp, Database};

/// Grant `user` access to `course`. Returns true if a new row was written.
pub async fn grant(db: &Database, user: UserId, course: CourseId) -> Result<bool, LecternError> {
    let inserted = db
        .connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO entitlements (user_id, course_id) VALUES (?1, ?2)
                 ON CONFLICT(user_id, course_id) DO NOTHING",
                params![user.0, course.0],
            )
        })
        .await
        .map_err(map_tr_err)?;

    debug!(user_id = %user, course_id = %course, new = inserted > 0, "entitlement granted");
    Ok(inserted > 0)
}

pub async fn is_entitled(
    db: &Database,
    user: UserId,
    course: CourseId,
) -> Result<bool, LecternError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM entitlements WHERE user_id = ?1 AND course_id = ?2)",
                params![user.0, course.0],
                |row| row.get(0),
            )
        })
        .await
        .map_err(map_tr_err)
}

pub async fn list_for_user(db: &Database, user: UserId) -> Result<Vec<Entitlement>, LecternError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT user_id, course_id, created_at FROM entitlements
                 WHERE user_id = ?1 ORDER BY id",
            )?;
            let rows = stmt.query_map(params![user.0], |row| {
                Ok(Entitlement {
                    user_id: UserId(row.get(0)?),
                    course_id: CourseId(row.get(1)?),
                    created_at: timestamp(row, 2)?,
                })
            })?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}
