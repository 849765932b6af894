// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use admissions_audit::{Actor, AuditEvent, Cause};
use admissions_domain::{NotificationKind, ResetToken, Role, UserId};
use time::OffsetDateTime;

/// The account fields a bulk action reads and may change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserState {
    /// The user's identifier.
    pub user_id: UserId,
    /// The user's email address.
    pub email: String,
    /// The user's display name.
    pub display_name: String,
    /// The user's current role.
    pub role: Role,
    /// Whether the account is active.
    pub is_active: bool,
    /// Whether the email address has been verified.
    pub email_verified: bool,
    /// Expiry of the outstanding password reset token, if one was issued.
    pub password_reset_expires_at: Option<OffsetDateTime>,
}

/// A single storage change that is part of a user transition.
///
/// Effects are applied in order. For deletions the order is the cleanup
/// order: sessions, then notifications, then the user row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserEffect {
    /// Set the active flag.
    SetActive(bool),
    /// Set the email verified flag.
    SetEmailVerified(bool),
    /// Replace the role.
    SetRole(Role),
    /// Store a password reset token and its expiry.
    SetResetToken {
        /// The freshly generated token.
        token: ResetToken,
        /// When the token stops being valid.
        expires_at: OffsetDateTime,
    },
    /// Remove every session belonging to the user.
    DeleteSessions,
    /// Remove every notification addressed to the user.
    DeleteNotifications,
    /// Remove the user row.
    DeleteUser,
}

/// A notification emitted for a successfully changed user.
///
/// The notification is data; storing and dispatching it is left to the
/// caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserNotification {
    /// The recipient.
    pub user_id: UserId,
    /// Short title.
    pub title: String,
    /// Message body.
    pub message: String,
    /// Severity.
    pub kind: NotificationKind,
}

/// Everything that must be persisted, atomically, for one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserTransition {
    /// The user being changed.
    pub user_id: UserId,
    /// The ordered storage changes.
    pub effects: Vec<UserEffect>,
    /// The audit event describing the change.
    pub audit_event: AuditEvent,
    /// The notification to deliver, if notifications were requested.
    pub notification: Option<UserNotification>,
}

/// The decision for one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The user must be changed.
    Apply(UserTransition),
    /// The user already has the target state.
    Skip {
        /// Why nothing was done.
        reason: String,
    },
}

/// Explicit context shared by every decision in one bulk request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyContext {
    /// The admin performing the request.
    pub actor: Actor,
    /// The request that triggered the changes.
    pub cause: Cause,
    /// Whether successful changes emit a notification.
    pub send_notification: bool,
    /// The instant the request is processed at.
    pub now: OffsetDateTime,
}

impl ApplyContext {
    /// Creates a new `ApplyContext`.
    #[must_use]
    pub const fn new(actor: Actor, cause: Cause, send_notification: bool, now: OffsetDateTime) -> Self {
        Self {
            actor,
            cause,
            send_notification,
            now,
        }
    }
}
