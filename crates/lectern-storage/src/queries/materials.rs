// SPDX-FileCopyrightText: 2026 Lectern Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Course material queries.

use lectern_core::{CourseId, LecternError, Material};
use rusqlite::params;

use crate::database::{map_tr_err, Database};

fn row_to_material(row: &rusqlite::Row<'_>) -> rusqlite::Result<Material> {
    Ok(Material {
        id: row.get(0)?,
        course_id: CourseId(row.get(1)?),
        file_name: row.get(2)?,
        storage_key: row.get(3)?,
    })
}

pub async fn add_material(
    db: &Database,
    course: CourseId,
    file_name: &str,
    storage_key: &str,
) -> Result<Material, LecternError> {
    let file_name = file_name.to_string();
    let storage_key = storage_key.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO materials (course_id, file_name, storage_key) VALUES (?1, ?2, ?3)",
                params![course.0, file_name, storage_key],
            )?;
            Ok(Material {
                id: conn.last_insert_rowid(),
                course_id: course,
                file_name,
                storage_key,
            })
        })
        .await
        .map_err(map_tr_err)
}

/// Materials for a course in upload order.
pub async fn list_materials(db: &Database, course: CourseId) -> Result<Vec<Material>, LecternError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, course_id, file_name, storage_key FROM materials
                 WHERE course_id = ?1 ORDER BY id",
            )?;
            let rows = stmt.query_map(params![course.0], row_to_material)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}
