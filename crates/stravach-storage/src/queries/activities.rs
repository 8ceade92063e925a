// SPDX-FileCopyrightText: 2026 Stravach Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Activity mirror operations.

use rusqlite::{OptionalExtension, Row, params};
use stravach_core::types::{ActivityId, UserActivity};
use stravach_core::StravachError;

use crate::database::Database;

const ACTIVITY_COLUMNS: &str = "id, user_id, name, distance, moving_time, elapsed_time,
     type, start_date, average_heartrate, average_speed, is_updated";

const INSERT_ACTIVITY: &str = "INSERT OR IGNORE INTO user_activities
     (id, user_id, name, distance, moving_time, elapsed_time, type, start_date,
      average_heartrate, average_speed, is_updated)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)";

fn row_to_activity(row: &Row<'_>) -> rusqlite::Result<UserActivity> {
    Ok(UserActivity {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        distance: row.get(3)?,
        moving_time: row.get(4)?,
        elapsed_time: row.get(5)?,
        activity_type: row.get(6)?,
        start_date: row.get(7)?,
        average_heartrate: row.get(8)?,
        average_speed: row.get(9)?,
        renamed: row.get(10)?,
    })
}

fn insert(conn: &rusqlite::Connection, a: &UserActivity) -> rusqlite::Result<usize> {
    conn.execute(
        INSERT_ACTIVITY,
        params![
            a.id,
            a.user_id,
            a.name,
            a.distance,
            a.moving_time,
            a.elapsed_time,
            a.activity_type,
            a.start_date,
            a.average_heartrate,
            a.average_speed,
            a.renamed,
        ],
    )
}

pub async fn get_activity(
    db: &Database,
    id: ActivityId,
) -> Result<Option<UserActivity>, StravachError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT {ACTIVITY_COLUMNS} FROM user_activities WHERE id = ?1"),
                params![id],
                row_to_activity,
            )
            .optional()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

pub async fn activity_exists(db: &Database, id: ActivityId) -> Result<bool, StravachError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM user_activities WHERE id = ?1)",
                params![id],
                |row| row.get(0),
            )
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Insert one activity. An already-mirrored id is left untouched.
pub async fn create_activity(db: &Database, activity: &UserActivity) -> Result<(), StravachError> {
    let activity = activity.clone();
    db.connection()
        .call(move |conn| insert(conn, &activity).map(|_| ()))
        .await
        .map_err(crate::database::map_tr_err)
}

/// Insert a batch in one transaction, skipping ids that already exist.
///
/// Returns how many rows were actually inserted.
pub async fn create_activities(
    db: &Database,
    activities: &[UserActivity],
) -> Result<usize, StravachError> {
    let activities = activities.to_vec();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let mut inserted = 0;
            for activity in &activities {
                inserted += insert(&tx, activity)?;
            }
            tx.commit()?;
            Ok(inserted)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Persist the mutable columns of a mirrored activity.
pub async fn update_activity(db: &Database, activity: &UserActivity) -> Result<(), StravachError> {
    let activity = activity.clone();
    let id = activity.id;
    let updated = db
        .connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE user_activities SET name = ?1, distance = ?2, moving_time = ?3,
                    elapsed_time = ?4, type = ?5, start_date = ?6,
                    average_heartrate = ?7, average_speed = ?8, is_updated = ?9
                 WHERE id = ?10",
                params![
                    activity.name,
                    activity.distance,
                    activity.moving_time,
                    activity.elapsed_time,
                    activity.activity_type,
                    activity.start_date,
                    activity.average_heartrate,
                    activity.average_speed,
                    activity.renamed,
                    activity.id,
                ],
            )
        })
        .await
        .map_err(crate::database::map_tr_err)?;

    if updated == 0 {
        return Err(StravachError::NotFound {
            entity: "activity",
            id: id.to_string(),
        });
    }
    Ok(())
}

/// A user's mirrored activities, newest first.
pub async fn list_user_activities(
    db: &Database,
    user_id: i64,
    limit: i64,
) -> Result<Vec<UserActivity>, StravachError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {ACTIVITY_COLUMNS} FROM user_activities
                 WHERE user_id = ?1 ORDER BY start_date DESC, id DESC LIMIT ?2"
            ))?;
            let rows = stmt.query_map(params![user_id, limit], row_to_activity)?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(crate::database::map_tr_err)
}
