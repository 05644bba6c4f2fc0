// SPDX-FileCopyrightText: 2026 Lectern Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Live stream records, at most one per course.

use lectern_core::{CourseId, LecternError, LiveStreamRecord, PlaybackPolicy};
use rusqlite::{params, OptionalExtension};

use crate::database::{map_tr_err, Database};

const SELECT_BY_COURSE: &str =
    "SELECT course_id, stream_id, playback_id, status, playback_policy
     FROM live_streams WHERE course_id = ?1";

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<LiveStreamRecord> {
    Ok(LiveStreamRecord {
        course_id: CourseId(row.get(0)?),
        stream_id: row.get(1)?,
        playback_id: row.get(2)?,
        status: row.get(3)?,
        playback_policy: policy(row, 4)?,
    })
}

fn policy(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<PlaybackPolicy> {
    let raw: String = row.get(idx)?;
    raw.parse().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

pub async fn get_live_stream(
    db: &Database,
    course: CourseId,
) -> Result<Option<LiveStreamRecord>, LecternError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(SELECT_BY_COURSE, params![course.0], row_to_record)
                .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Insert unless the course already has a stream; return the stored record.
///
/// Two concurrent starts for one course therefore agree on a single stream.
pub async fn insert_live_stream(
    db: &Database,
    record: LiveStreamRecord,
) -> Result<LiveStreamRecord, LecternError> {
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO live_streams (course_id, stream_id, playback_id, status, playback_policy)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(course_id) DO NOTHING",
                params![
                    record.course_id.0,
                    record.stream_id,
                    record.playback_id,
                    record.status,
                    record.playback_policy.to_string()
                ],
            )?;
            conn.query_row(SELECT_BY_COURSE, params![record.course_id.0], row_to_record)
        })
        .await
        .map_err(map_tr_err)
}

/// Set the status of the stream with the given provider id. Returns false when
/// no record matches.
pub async fn update_status_by_stream_id(
    db: &Database,
    stream_id: &str,
    status: &str,
) -> Result<bool, LecternError> {
    let stream_id = stream_id.to_string();
    let status = status.to_string();
    let updated = db
        .connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE live_streams
                 SET status = ?1, updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE stream_id = ?2",
                params![status, stream_id],
            )
        })
        .await
        .map_err(map_tr_err)?;
    Ok(updated > 0)
}

#[cfg(test)]
mod tests {
    use lectern_core::Role;

    use super::*;
    use crate::test_support::{seed_course, seed_user};

    fn record(course: CourseId, stream: &str) -> LiveStreamRecord {
        LiveStreamRecord {
            course_id: course,
            stream_id: stream.into(),
            playback_id: Some(format!("pb-{stream}")),
            status: "idle".into(),
            playback_policy: PlaybackPolicy::Signed,
        }
    }

    #[tokio::test]
    async fn insert_then_get() {
        let db = Database::open_in_memory().await.unwrap();
        let instructor = seed_user(&db, "teach@example.com", Role::Instructor).await;
        let course = seed_course(&db, instructor.id).await;

        let stored = insert_live_stream(&db, record(course.id, "ls-1")).await.unwrap();
        assert_eq!(stored.stream_id, "ls-1");
        assert_eq!(get_live_stream(&db, course.id).await.unwrap(), Some(stored));
    }

    #[tokio::test]
    async fn second_insert_keeps_first_stream() {
        let db = Database::open_in_memory().await.unwrap();
        let instructor = seed_user(&db, "teach@example.com", Role::Instructor).await;
        let course = seed_course(&db, instructor.id).await;

        insert_live_stream(&db, record(course.id, "ls-1")).await.unwrap();
        let second = LiveStreamRecord {
            playback_policy: PlaybackPolicy::Public,
            ..record(course.id, "ls-2")
        };
        let stored = insert_live_stream(&db, second).await.unwrap();
        assert_eq!(stored.stream_id, "ls-1");
        assert_eq!(stored.playback_policy, PlaybackPolicy::Signed);
    }

    #[tokio::test]
    async fn update_status_by_stream_id_matches_only_known_streams() {
        let db = Database::open_in_memory().await.unwrap();
        let instructor = seed_user(&db, "teach@example.com", Role::Instructor).await;
        let course = seed_course(&db, instructor.id).await;
        insert_live_stream(&db, record(course.id, "ls-1")).await.unwrap();

        assert!(update_status_by_stream_id(&db, "ls-1", "active").await.unwrap());
        assert!(!update_status_by_stream_id(&db, "ls-unknown", "active").await.unwrap());

        let stored = get_live_stream(&db, course.id).await.unwrap().unwrap();
        assert!(stored.is_active());
    }
}
