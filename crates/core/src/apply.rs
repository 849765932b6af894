// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::command::BulkAction;
use crate::error::CoreError;
use crate::state::{ApplyContext, Outcome, UserEffect, UserNotification, UserState, UserTransition};
use admissions_audit::{Action, AuditEvent, StateSnapshot, Subject};
use admissions_domain::{Dependents, NotificationKind, ResetToken, Role, validate_deletable};
use time::format_description::well_known::Rfc3339;
use time::{Duration, OffsetDateTime};

/// How long a password reset token stays valid.
pub const RESET_TOKEN_VALIDITY: Duration = Duration::hours(24);

/// Decides what a bulk action does to one user.
///
/// Every action variant is handled by its own function; the match is
/// exhaustive so a new variant cannot be forgotten.
///
/// # Arguments
///
/// * `context` - The actor, cause and request flags
/// * `action` - The action to apply
/// * `user` - The current state of the target user
/// * `dependents` - Dependent record counts (required for `Delete`)
///
/// # Returns
///
/// * `Ok(Outcome::Apply)` with the transition to persist
/// * `Ok(Outcome::Skip)` when the user already has the target state
///
/// # Errors
///
/// Returns an error if:
/// - Referential blockers prevent a deletion
/// - `Delete` is requested without dependent counts
pub fn apply(
    context: &ApplyContext,
    action: &BulkAction,
    user: &UserState,
    dependents: Option<&Dependents>,
) -> Result<Outcome, CoreError> {
    match action {
        BulkAction::Activate => Ok(apply_activate(context, action, user)),
        BulkAction::Deactivate => Ok(apply_deactivate(context, action, user)),
        BulkAction::Delete => {
            let dependents: &Dependents = dependents.ok_or_else(|| {
                CoreError::Internal(String::from("Dependent counts are required for delete"))
            })?;
            apply_delete(context, action, user, dependents)
        }
        BulkAction::SendPasswordReset => Ok(apply_send_password_reset(context, action, user)),
        BulkAction::ChangeRole { new_role } => {
            Ok(apply_change_role(context, action, user, *new_role))
        }
        BulkAction::VerifyEmail => Ok(apply_verify_email(context, action, user)),
    }
}

fn apply_activate(context: &ApplyContext, action: &BulkAction, user: &UserState) -> Outcome {
    if user.is_active {
        return skip("User is already active");
    }

    let notification: UserNotification = notify(
        user,
        "Account Activated",
        String::from("Your account has been activated. You can now sign in."),
        NotificationKind::Success,
    );
    transition(
        context,
        action,
        user,
        vec![UserEffect::SetActive(true)],
        ("is_active=false".to_string(), "is_active=true".to_string()),
        format!("Activated user {}", user.email),
        notification,
    )
}

fn apply_deactivate(context: &ApplyContext, action: &BulkAction, user: &UserState) -> Outcome {
    if !user.is_active {
        return skip("User is already inactive");
    }

    let notification: UserNotification = notify(
        user,
        "Account Deactivated",
        String::from(
            "Your account has been deactivated. Contact an administrator if you think this is a mistake.",
        ),
        NotificationKind::Warning,
    );
    transition(
        context,
        action,
        user,
        vec![UserEffect::SetActive(false), UserEffect::DeleteSessions],
        ("is_active=true".to_string(), "is_active=false".to_string()),
        format!("Deactivated user {} and ended their sessions", user.email),
        notification,
    )
}

fn apply_delete(
    context: &ApplyContext,
    action: &BulkAction,
    user: &UserState,
    dependents: &Dependents,
) -> Result<Outcome, CoreError> {
    validate_deletable(user.role, dependents)?;

    let before: String = format!(
        "email={}, display_name={}, role={}, is_active={}, email_verified={}",
        user.email, user.display_name, user.role, user.is_active, user.email_verified
    );
    let event: AuditEvent = audit_event(
        context,
        action,
        user,
        (before, String::from("deleted")),
        format!("Deleted user {}", user.email),
    );

    // The account is gone afterwards; nobody to notify.
    Ok(Outcome::Apply(UserTransition {
        user_id: user.user_id.clone(),
        effects: vec![
            UserEffect::DeleteSessions,
            UserEffect::DeleteNotifications,
            UserEffect::DeleteUser,
        ],
        audit_event: event,
        notification: None,
    }))
}

fn apply_send_password_reset(
    context: &ApplyContext,
    action: &BulkAction,
    user: &UserState,
) -> Outcome {
    let token: ResetToken = ResetToken::generate();
    let expires_at: OffsetDateTime = context.now + RESET_TOKEN_VALIDITY;

    let notification: UserNotification = notify(
        user,
        "Password Reset Request",
        String::from(
            "An administrator has requested a password reset for your account. The reset link is valid for 24 hours.",
        ),
        NotificationKind::Info,
    );
    let before: String = match user.password_reset_expires_at {
        None => String::from("password_reset=none"),
        Some(previous) if previous > context.now => {
            format!("password_reset=pending, expires_at={}", timestamp(previous))
        }
        Some(previous) => format!("password_reset=expired, expires_at={}", timestamp(previous)),
    };
    let after: String = format!("password_reset=issued, expires_at={}", timestamp(expires_at));
    // The token itself never goes into the audit trail.
    transition(
        context,
        action,
        user,
        vec![UserEffect::SetResetToken { token, expires_at }],
        (before, after),
        format!("Issued password reset token for {}", user.email),
        notification,
    )
}

fn timestamp(instant: OffsetDateTime) -> String {
    instant
        .format(&Rfc3339)
        .unwrap_or_else(|_| instant.to_string())
}

fn apply_change_role(
    context: &ApplyContext,
    action: &BulkAction,
    user: &UserState,
    new_role: Role,
) -> Outcome {
    if user.role == new_role {
        return skip(&format!("User already has role {}", new_role.label()));
    }

    let notification: UserNotification = notify(
        user,
        "Role Changed",
        format!(
            "Your role has been changed from {} to {}.",
            user.role.label(),
            new_role.label()
        ),
        NotificationKind::Info,
    );
    transition(
        context,
        action,
        user,
        vec![UserEffect::SetRole(new_role)],
        (format!("role={}", user.role), format!("role={new_role}")),
        format!(
            "Changed role of {} from {} to {new_role}",
            user.email, user.role
        ),
        notification,
    )
}

fn apply_verify_email(context: &ApplyContext, action: &BulkAction, user: &UserState) -> Outcome {
    if user.email_verified {
        return skip("Email is already verified");
    }

    let notification: UserNotification = notify(
        user,
        "Email Verified",
        format!("Your email address {} has been verified.", user.email),
        NotificationKind::Success,
    );
    transition(
        context,
        action,
        user,
        vec![UserEffect::SetEmailVerified(true)],
        (
            "email_verified=false".to_string(),
            "email_verified=true".to_string(),
        ),
        format!("Verified email {}", user.email),
        notification,
    )
}

fn skip(reason: &str) -> Outcome {
    Outcome::Skip {
        reason: reason.to_string(),
    }
}

fn notify(user: &UserState, title: &str, message: String, kind: NotificationKind) -> UserNotification {
    UserNotification {
        user_id: user.user_id.clone(),
        title: title.to_string(),
        message,
        kind,
    }
}

fn audit_event(
    context: &ApplyContext,
    action: &BulkAction,
    user: &UserState,
    (before, after): (String, String),
    details: String,
) -> AuditEvent {
    AuditEvent::new(
        context.actor.clone(),
        context.cause.clone(),
        Action::new(action.audit_name().to_string(), Some(details)),
        Subject::user(&user.user_id),
        StateSnapshot::new(before),
        StateSnapshot::new(after),
    )
}

fn transition(
    context: &ApplyContext,
    action: &BulkAction,
    user: &UserState,
    effects: Vec<UserEffect>,
    snapshots: (String, String),
    details: String,
    notification: UserNotification,
) -> Outcome {
    Outcome::Apply(UserTransition {
        user_id: user.user_id.clone(),
        effects,
        audit_event: audit_event(context, action, user, snapshots, details),
        notification: context.send_notification.then_some(notification),
    })
}
