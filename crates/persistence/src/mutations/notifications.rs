// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use admissions_domain::NotificationKind;
use diesel::SqliteConnection;
use diesel::prelude::*;
use tracing::{debug, info};

use crate::backend::PersistenceBackend;
use crate::diesel_schema::notifications;
use crate::error::PersistenceError;

/// Adds a notification to a user's inbox.
///
/// # Errors
///
/// Returns an error if the insert fails (for example, unknown user).
pub fn insert_notification(
    conn: &mut SqliteConnection,
    user_id: &str,
    title: &str,
    message: &str,
    kind: NotificationKind,
) -> Result<i64, PersistenceError> {
    diesel::insert_into(notifications::table)
        .values((
            notifications::user_id.eq(user_id),
            notifications::title.eq(title),
            notifications::message.eq(message),
            notifications::notification_type.eq(kind.as_str()),
        ))
        .execute(conn)?;

    let notification_id: i64 = conn.get_last_insert_rowid()?;

    debug!(notification_id, user_id, title, "Notification stored");
    Ok(notification_id)
}

/// Deletes every notification addressed to a user.
///
/// # Errors
///
/// Returns an error if the database delete fails.
pub fn delete_notifications_for_user(
    conn: &mut SqliteConnection,
    user_id: &str,
) -> Result<usize, PersistenceError> {
    let rows_affected: usize = diesel::delete(notifications::table)
        .filter(notifications::user_id.eq(user_id))
        .execute(conn)?;

    info!(user_id, rows_affected, "Deleted notifications for user");
    Ok(rows_affected)
}

/// Marks a notification as read.
///
/// # Errors
///
/// Returns an error if the update fails or the notification does not exist.
pub fn mark_notification_read(
    conn: &mut SqliteConnection,
    notification_id: i64,
) -> Result<(), PersistenceError> {
    let rows_affected: usize = diesel::update(notifications::table)
        .filter(notifications::notification_id.eq(notification_id))
        .set(notifications::is_read.eq(1))
        .execute(conn)?;

    if rows_affected == 0 {
        return Err(PersistenceError::NotificationNotFound(notification_id));
    }
    Ok(())
}
