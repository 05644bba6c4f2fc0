// SPDX-FileCopyrightText: 2026 Lectern Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Account queries.

use std::str::FromStr;

use lectern_core::{LecternError, NewUser, Role, User, UserId};
use rusqlite::{params, OptionalExtension};

use crate::database::{map_tr_err, timestamp, Database};

const USER_COLUMNS: &str = "id, name, email, role, created_at";

fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    let role: String = row.get(3)?;
    let role = Role::from_str(&role).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(User {
        id: UserId(row.get(0)?),
        name: row.get(1)?,
        email: row.get(2)?,
        role,
        created_at: timestamp(row, 4)?,
    })
}

/// Insert an account. A taken email is a conflict, detected via the UNIQUE
/// constraint rather than a prior lookup.
pub async fn create_user(db: &Database, user: NewUser) -> Result<User, LecternError> {
    let email = user.email.clone();
    let created = db
        .connection()
        .call(move |conn| {
            let inserted = conn.execute(
                "INSERT INTO users (name, email, password_hash, role)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(email) DO NOTHING",
                params![user.name, user.email, user.password_hash, user.role.to_string()],
            )?;
            if inserted == 0 {
                return Ok(None);
            }
            let id = conn.last_insert_rowid();
            conn.query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
                params![id],
                row_to_user,
            )
            .map(Some)
        })
        .await
        .map_err(map_tr_err)?;

    created.ok_or_else(|| LecternError::Conflict(format!("user {email} already exists")))
}

/// Fetch an account and its password hash by email.
pub async fn find_user_by_email(
    db: &Database,
    email: &str,
) -> Result<Option<(User, String)>, LecternError> {
    let email = email.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT {USER_COLUMNS}, password_hash FROM users WHERE email = ?1"),
                params![email],
                |row| Ok((row_to_user(row)?, row.get(5)?)),
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get_user(db: &Database, id: UserId) -> Result<Option<User>, LecternError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
                params![id.0],
                row_to_user,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(email: &str, role: Role) -> NewUser {
        NewUser {
            name: "Test User".into(),
            email: email.into(),
            password_hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".into(),
            role,
        }
    }

    #[tokio::test]
    async fn create_and_find_user() {
        let db = Database::open_in_memory().await.unwrap();
        let user = create_user(&db, new_user("ada@example.com", Role::Instructor))
            .await
            .unwrap();
        assert_eq!(user.email, "ada@example.com");
        assert_eq!(user.role, Role::Instructor);

        let (found, hash) = find_user_by_email(&db, "ada@example.com")
            .await
            .unwrap()
            .expect("user should exist");
        assert_eq!(found, user);
        assert!(hash.starts_with("$argon2id$"));

        assert_eq!(get_user(&db, user.id).await.unwrap(), Some(user));
    }

    #[tokio::test]
    async fn duplicate_email_is_conflict() {
        let db = Database::open_in_memory().await.unwrap();
        create_user(&db, new_user("dup@example.com", Role::Student))
            .await
            .unwrap();
        let err = create_user(&db, new_user("dup@example.com", Role::Student))
            .await
            .unwrap_err();
        assert!(matches!(err, LecternError::Conflict(_)));
    }

    #[tokio::test]
    async fn unknown_user_is_none() {
        let db = Database::open_in_memory().await.unwrap();
        assert!(find_user_by_email(&db, "nobody@example.com").await.unwrap().is_none());
        assert!(get_user(&db, UserId(42)).await.unwrap().is_none());
    }
}
