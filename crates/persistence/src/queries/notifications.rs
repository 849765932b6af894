// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use diesel::SqliteConnection;
use diesel::dsl::count;
use diesel::prelude::*;
use tracing::debug;

use crate::data_models::NotificationData;
use crate::diesel_schema::notifications;
use crate::error::PersistenceError;

/// Diesel Queryable struct for notification rows.
#[derive(Queryable, Selectable)]
#[diesel(table_name = notifications)]
struct NotificationRow {
    notification_id: i64,
    user_id: String,
    title: String,
    message: String,
    notification_type: String,
    is_read: i32,
    created_at: String,
}

impl From<NotificationRow> for NotificationData {
    fn from(row: NotificationRow) -> Self {
        Self {
            notification_id: row.notification_id,
            user_id: row.user_id,
            title: row.title,
            message: row.message,
            notification_type: row.notification_type,
            is_read: row.is_read != 0,
            created_at: row.created_at,
        }
    }
}

/// Retrieves a notification by ID.
///
/// # Errors
///
/// Returns an error if the database query fails.
/// Returns `Ok(None)` if the notification is not found.
pub fn get_notification(
    conn: &mut SqliteConnection,
    notification_id: i64,
) -> Result<Option<NotificationData>, PersistenceError> {
    let result: Result<NotificationRow, diesel::result::Error> = notifications::table
        .filter(notifications::notification_id.eq(notification_id))
        .select(NotificationRow::as_select())
        .first(conn);

    match result {
        Ok(row) => Ok(Some(NotificationData::from(row))),
        Err(diesel::result::Error::NotFound) => Ok(None),
        Err(e) => Err(PersistenceError::from(e)),
    }
}

/// Lists the notifications addressed to a user, newest first.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn list_notifications_for_user(
    conn: &mut SqliteConnection,
    user_id: &str,
) -> Result<Vec<NotificationData>, PersistenceError> {
    debug!(user_id, "Listing notifications");

    let rows: Vec<NotificationRow> = notifications::table
        .filter(notifications::user_id.eq(user_id))
        .order(notifications::notification_id.desc())
        .select(NotificationRow::as_select())
        .load(conn)?;

    Ok(rows.into_iter().map(NotificationData::from).collect())
}

/// Counts the notifications addressed to a user.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn count_notifications_for_user(
    conn: &mut SqliteConnection,
    user_id: &str,
) -> Result<i64, PersistenceError> {
    let total: i64 = notifications::table
        .filter(notifications::user_id.eq(user_id))
        .select(count(notifications::notification_id))
        .first(conn)?;
    Ok(total)
}
