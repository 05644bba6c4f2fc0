// SPDX-FileCopyrightText: 2026 Lectern Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Course catalog queries.

use lectern_core::{Course, CourseId, LecternError, NewCourse, UserId};
use rusqlite::{params, params_from_iter, OptionalExtension};

use crate::database::{map_tr_err, timestamp, Database};

const COURSE_COLUMNS: &str = "id, title, description, price_cents, instructor_id, created_at";

fn row_to_course(row: &rusqlite::Row<'_>) -> rusqlite::Result<Course> {
    Ok(Course {
        id: CourseId(row.get(0)?),
        title: row.get(1)?,
        description: row.get(2)?,
        price_cents: row.get(3)?,
        instructor_id: UserId(row.get(4)?),
        created_at: timestamp(row, 5)?,
    })
}

pub async fn create_course(db: &Database, course: NewCourse) -> Result<Course, LecternError> {
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO courses (title, description, price_cents, instructor_id)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    course.title,
                    course.description,
                    course.price_cents,
                    course.instructor_id.0
                ],
            )?;
            let id = conn.last_insert_rowid();
            conn.query_row(
                &format!("SELECT {COURSE_COLUMNS} FROM courses WHERE id = ?1"),
                params![id],
                row_to_course,
            )
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get_course(db: &Database, id: CourseId) -> Result<Option<Course>, LecternError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT {COURSE_COLUMNS} FROM courses WHERE id = ?1"),
                params![id.0],
                row_to_course,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// All courses, newest first.
pub async fn list_courses(db: &Database) -> Result<Vec<Course>, LecternError> {
    db.connection()
        .call(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COURSE_COLUMNS} FROM courses ORDER BY created_at DESC, id DESC"
            ))?;
            let rows = stmt.query_map([], row_to_course)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

/// Courses whose id is in `ids`. Unknown ids are skipped.
pub async fn courses_by_ids(db: &Database, ids: &[CourseId]) -> Result<Vec<Course>, LecternError> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let ids: Vec<i64> = ids.iter().map(|id| id.0).collect();
    db.connection()
        .call(move |conn| {
            let placeholders = vec!["?"; ids.len()].join(", ");
            let mut stmt = conn.prepare(&format!(
                "SELECT {COURSE_COLUMNS} FROM courses WHERE id IN ({placeholders}) ORDER BY id"
            ))?;
            let rows = stmt.query_map(params_from_iter(ids.iter()), row_to_course)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use lectern_core::Role;

    use super::*;
    use crate::test_support::seed_user;

    fn new_course(title: &str, instructor: UserId) -> NewCourse {
        NewCourse {
            title: title.into(),
            description: Some("Learn things".into()),
            price_cents: 4900,
            instructor_id: instructor,
        }
    }

    #[tokio::test]
    async fn create_get_and_list() {
        let db = Database::open_in_memory().await.unwrap();
        let instructor = seed_user(&db, "teach@example.com", Role::Instructor).await;

        let rust = create_course(&db, new_course("Rust", instructor.id)).await.unwrap();
        let sql = create_course(&db, new_course("SQL", instructor.id)).await.unwrap();

        assert_eq!(get_course(&db, rust.id).await.unwrap(), Some(rust.clone()));
        assert_eq!(rust.price_cents, 4900);

        let all = list_courses(&db).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, sql.id, "newest first");
    }

    #[tokio::test]
    async fn course_requires_existing_instructor() {
        let db = Database::open_in_memory().await.unwrap();
        let result = create_course(&db, new_course("Orphan", UserId(404))).await;
        assert!(matches!(result, Err(LecternError::Storage { .. })));
    }

    #[tokio::test]
    async fn negative_price_is_rejected() {
        let db = Database::open_in_memory().await.unwrap();
        let instructor = seed_user(&db, "teach@example.com", Role::Instructor).await;
        let mut course = new_course("Free money", instructor.id);
        course.price_cents = -1;
        assert!(create_course(&db, course).await.is_err());
    }

    #[tokio::test]
    async fn courses_by_ids_skips_unknown() {
        let db = Database::open_in_memory().await.unwrap();
        let instructor = seed_user(&db, "teach@example.com", Role::Instructor).await;
        let a = create_course(&db, new_course("A", instructor.id)).await.unwrap();

        let found = courses_by_ids(&db, &[a.id, CourseId(9999)]).await.unwrap();
        assert_eq!(found, vec![a]);
        assert!(courses_by_ids(&db, &[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_course_is_none() {
        let db = Database::open_in_memory().await.unwrap();
        assert!(get_course(&db, CourseId(7)).await.unwrap().is_none());
    }
}
