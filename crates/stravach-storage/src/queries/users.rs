// SPDX-FileCopyrightText: 2026 Stravach Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! User CRUD operations.

use rusqlite::{OptionalExtension, Row, params};
use stravach_core::types::{ChatId, User};
use stravach_core::StravachError;

use crate::database::Database;

const USER_COLUMNS: &str = "id, strava_id, telegram_chat_id, username, email,
     strava_refresh_token, strava_access_token, strava_access_code,
     token_expires_at, language, is_admin";

fn row_to_user(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        strava_id: row.get(1)?,
        chat_id: row.get(2)?,
        username: row.get(3)?,
        email: row.get(4)?,
        refresh_token: row.get(5)?,
        access_token: row.get(6)?,
        access_code: row.get(7)?,
        token_expires_at: row.get(8)?,
        language: row.get(9)?,
        is_admin: row.get(10)?,
    })
}

async fn get_user_where(
    db: &Database,
    column: &'static str,
    value: i64,
) -> Result<Option<User>, StravachError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE {column} = ?1"),
                params![value],
                row_to_user,
            )
            .optional()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Look a user up by the chat they talk to the bot from.
pub async fn get_user_by_chat_id(
    db: &Database,
    chat_id: ChatId,
) -> Result<Option<User>, StravachError> {
    get_user_where(db, "telegram_chat_id", chat_id).await
}

pub async fn get_user(db: &Database, id: i64) -> Result<Option<User>, StravachError> {
    get_user_where(db, "id", id).await
}

/// Look a user up by upstream athlete id (webhook `owner_id`).
pub async fn get_user_by_strava_id(
    db: &Database,
    strava_id: i64,
) -> Result<Option<User>, StravachError> {
    get_user_where(db, "strava_id", strava_id).await
}

pub async fn user_exists_by_chat_id(db: &Database, chat_id: ChatId) -> Result<bool, StravachError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM users WHERE telegram_chat_id = ?1)",
                params![chat_id],
                |row| row.get(0),
            )
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Insert a user. The returned copy carries the assigned row id.
pub async fn create_user(db: &Database, user: &User) -> Result<User, StravachError> {
    let mut user = user.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO users (strava_id, telegram_chat_id, username, email,
                    strava_refresh_token, strava_access_token, strava_access_code,
                    token_expires_at, language, is_admin)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    user.strava_id,
                    user.chat_id,
                    user.username,
                    user.email,
                    user.refresh_token,
                    user.access_token,
                    user.access_code,
                    user.token_expires_at,
                    user.language,
                    user.is_admin,
                ],
            )?;
            user.id = conn.last_insert_rowid();
            Ok(user)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Overwrite every mutable column of an existing user.
pub async fn update_user(db: &Database, user: &User) -> Result<(), StravachError> {
    let user = user.clone();
    let id = user.id;
    let updated = db
        .connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE users SET strava_id = ?1, username = ?2, email = ?3,
                    strava_refresh_token = ?4, strava_access_token = ?5,
                    strava_access_code = ?6, token_expires_at = ?7, language = ?8,
                    is_admin = ?9
                 WHERE id = ?10",
                params![
                    user.strava_id,
                    user.username,
                    user.email,
                    user.refresh_token,
                    user.access_token,
                    user.access_code,
                    user.token_expires_at,
                    user.language,
                    user.is_admin,
                    user.id,
                ],
            )
        })
        .await
        .map_err(crate::database::map_tr_err)?;

    if updated == 0 {
        return Err(StravachError::NotFound {
            entity: "user",
            id: id.to_string(),
        });
    }
    Ok(())
}
