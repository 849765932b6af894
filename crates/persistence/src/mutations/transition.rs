// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Persists the transition decided for one user.

use admissions::{UserEffect, UserTransition};
use diesel::SqliteConnection;
use time::format_description::well_known::Rfc3339;
use tracing::debug;

use crate::error::PersistenceError;
use crate::mutations::{audit, notifications, sessions, users};

/// Identifiers assigned while persisting a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PersistTransitionResult {
    /// The audit event recorded for the transition.
    pub event_id: i64,
    /// The stored notification, if one was emitted.
    pub notification_id: Option<i64>,
}

/// Applies every effect of a transition, then records its audit event and
/// notification.
///
/// This does not open a transaction; callers wrap it in one so that a
/// failure part way through leaves nothing behind.
///
/// # Errors
///
/// Returns the first storage error encountered.
pub fn persist_user_transition(
    conn: &mut SqliteConnection,
    transition: &UserTransition,
) -> Result<PersistTransitionResult, PersistenceError> {
    let user_id: &str = transition.user_id.as_str();

    for effect in &transition.effects {
        match effect {
            UserEffect::SetActive(is_active) => users::set_active(conn, user_id, *is_active)?,
            UserEffect::SetEmailVerified(verified) => {
                users::set_email_verified(conn, user_id, *verified)?;
            }
            UserEffect::SetRole(role) => users::set_role(conn, user_id, *role)?,
            UserEffect::SetResetToken { token, expires_at } => {
                let expires_at: String = expires_at
                    .format(&Rfc3339)
                    .map_err(|e| PersistenceError::SerializationError(e.to_string()))?;
                users::set_password_reset(conn, user_id, token.as_str(), &expires_at)?;
            }
            UserEffect::DeleteSessions => {
                sessions::delete_sessions_for_user(conn, user_id)?;
            }
            UserEffect::DeleteNotifications => {
                notifications::delete_notifications_for_user(conn, user_id)?;
            }
            UserEffect::DeleteUser => users::delete_user(conn, user_id)?,
        }
    }

    let event_id: i64 = audit::persist_audit_event(conn, &transition.audit_event)?;

    let notification_id: Option<i64> = match &transition.notification {
        Some(notification) => Some(notifications::insert_notification(
            conn,
            notification.user_id.as_str(),
            &notification.title,
            &notification.message,
            notification.kind,
        )?),
        None => None,
    };

    debug!(user_id, event_id, ?notification_id, "Persisted user transition");
    Ok(PersistTransitionResult {
        event_id,
        notification_id,
    })
}
