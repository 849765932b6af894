// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! API handler functions for state-changing and read-only operations.

use admissions::{ApplyContext, BulkAction, Outcome, UserState, UserTransition, apply};
use admissions_audit::{AuditEvent, Cause};
use admissions_domain::{
    DEFAULT_MAX_BATCH_SIZE, Dependents, DomainError, Role, UserId, normalize_targets,
    validate_batch_size,
};
use admissions_persistence::{
    NewUser, NotificationData, PersistTransitionResult, Persistence, PersistenceError,
    TransactionError, UserData,
};
use time::OffsetDateTime;
use tracing::{info, warn};

use crate::auth::{AuthenticatedActor, AuthenticationService, AuthorizationService};
use crate::error::{ApiError, translate_core_error, translate_domain_error};
use crate::request_response::{
    AuditEventInfo, BulkStatistics, BulkUserActionRequest, BulkUserActionResponse,
    DeliveredNotification, ListAuditEventsResponse, ListNotificationsResponse, ListUsersResponse,
    LoginRequest, LoginResponse, MarkNotificationReadResponse, NotificationInfo, ProcessStatus,
    ProcessedUser, UserInfo, WhoAmIResponse,
};

/// Limits applied to bulk requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BulkActionConfig {
    /// The largest number of users one request may select.
    pub max_batch_size: usize,
}

impl Default for BulkActionConfig {
    fn default() -> Self {
        Self {
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
        }
    }
}

/// Why one user's unit of work was rolled back.
enum UnitFailure {
    /// A rule rejected the action for this user.
    Rejected(ApiError),
    /// Storage failed while applying the action.
    Storage(PersistenceError),
}

impl From<PersistenceError> for UnitFailure {
    fn from(err: PersistenceError) -> Self {
        Self::Storage(err)
    }
}

impl UnitFailure {
    /// The text reported for the user, without the API error prefix.
    fn into_reason(self) -> String {
        match self {
            Self::Rejected(
                ApiError::AuthenticationFailed { reason: message }
                | ApiError::DomainRuleViolation { message, .. }
                | ApiError::InvalidInput { message, .. }
                | ApiError::ResourceNotFound { message, .. }
                | ApiError::Internal { message },
            ) => message,
            Self::Rejected(err @ ApiError::Unauthorized { .. }) => err.to_string(),
            Self::Storage(err) => err.to_string(),
        }
    }
}

/// Per-user entries and the notifications to deliver.
type BatchOutput = (Vec<ProcessedUser>, Vec<DeliveredNotification>);

/// What one user's committed unit of work produced.
enum UnitResult {
    Applied(Option<DeliveredNotification>),
    Skipped(String),
}

/// Runs one action against a set of users.
///
/// The whole batch runs in one transaction. Each user is a nested unit of
/// work: a failure for one user rolls back only that user's changes and is
/// reported in the response, while the rest of the batch continues.
///
/// # Arguments
///
/// * `persistence` - The persistence layer
/// * `request` - The bulk request
/// * `authenticated_actor` - The authenticated actor making the request
/// * `actor_user` - The stored account of the actor
/// * `cause` - The cause of this request
/// * `config` - Batch limits
///
/// # Errors
///
/// Returns an error if:
/// - The actor is not an administrator
/// - The action or new role is invalid
/// - No users remain after removing the actor
/// - The selection exceeds the batch bound
/// - The batch transaction cannot be controlled (nothing is committed)
pub fn bulk_user_action(
    persistence: &mut Persistence,
    request: &BulkUserActionRequest,
    authenticated_actor: &AuthenticatedActor,
    actor_user: &UserData,
    cause: Cause,
    config: BulkActionConfig,
) -> Result<BulkUserActionResponse, ApiError> {
    AuthorizationService::authorize_bulk_user_action(authenticated_actor)?;

    let targets: Vec<UserId> = normalize_targets(&request.user_ids, &authenticated_actor.user_id)
        .map_err(translate_domain_error)?;
    let action: BulkAction = BulkAction::parse(&request.action, request.new_role.as_deref())
        .map_err(translate_domain_error)?;
    validate_batch_size(targets.len(), config.max_batch_size).map_err(translate_domain_error)?;

    let context: ApplyContext = ApplyContext::new(
        authenticated_actor.to_audit_actor(actor_user),
        cause,
        request.send_notification,
        OffsetDateTime::now_utc(),
    );

    info!(
        action = action.name(),
        actor_id = %authenticated_actor.user_id,
        targets = targets.len(),
        "Processing bulk user action"
    );

    let batch: Result<BatchOutput, TransactionError<PersistenceError>> =
        persistence.in_transaction(|p| {
            let mut processed: Vec<ProcessedUser> = Vec::with_capacity(targets.len());
            let mut notifications: Vec<DeliveredNotification> = Vec::new();
            for target in &targets {
                let (entry, notification) = process_user(p, &context, &action, target)?;
                processed.push(entry);
                notifications.extend(notification);
            }
            Ok((processed, notifications))
        });

    let (processed_users, notifications) = batch.map_err(|e| {
        warn!(action = action.name(), error = %e, "Bulk user action rolled back");
        ApiError::Internal {
            message: format!("Bulk action failed and was rolled back: {e}"),
        }
    })?;

    Ok(build_response(&action, processed_users, notifications))
}

/// Processes one user as a nested unit of work.
///
/// Returns `Err` only when the unit's savepoint itself cannot be controlled,
/// which aborts the batch.
fn process_user(
    persistence: &mut Persistence,
    context: &ApplyContext,
    action: &BulkAction,
    target: &UserId,
) -> Result<(ProcessedUser, Option<DeliveredNotification>), PersistenceError> {
    let mut email: Option<String> = None;

    let unit: Result<UnitResult, TransactionError<UnitFailure>> = persistence.in_transaction(|p| {
        let Some(user) = p.get_user_by_id(target.as_str())? else {
            return Err(UnitFailure::Rejected(translate_domain_error(
                DomainError::UserNotFound(target.as_str().to_string()),
            )));
        };
        email = Some(user.email.clone());

        let dependents: Option<Dependents> = if action.requires_dependents() {
            Some(p.count_dependents(target.as_str())?)
        } else {
            None
        };

        let state: UserState = user.to_user_state()?;
        match apply(context, action, &state, dependents.as_ref()) {
            Ok(Outcome::Skip { reason }) => Ok(UnitResult::Skipped(reason)),
            Ok(Outcome::Apply(transition)) => {
                let persisted: PersistTransitionResult = p.persist_user_transition(&transition)?;
                Ok(UnitResult::Applied(delivered_notification(&transition, &persisted)))
            }
            Err(err) => Err(UnitFailure::Rejected(translate_core_error(err))),
        }
    });

    let (status, reason, notification) = match unit {
        Ok(UnitResult::Applied(notification)) => {
            info!(user_id = %target, action = action.name(), "User processed");
            (ProcessStatus::Success, None, notification)
        }
        Ok(UnitResult::Skipped(reason)) => {
            info!(user_id = %target, action = action.name(), reason = %reason, "User skipped");
            (ProcessStatus::Skipped, Some(reason), None)
        }
        Err(TransactionError::Aborted(failure)) => {
            let reason: String = failure.into_reason();
            warn!(user_id = %target, action = action.name(), reason = %reason, "User failed");
            (ProcessStatus::Error, Some(reason), None)
        }
        Err(TransactionError::Control(err)) => return Err(err),
    };

    Ok((
        ProcessedUser {
            id: target.as_str().to_string(),
            email,
            action: action.name().to_string(),
            status,
            reason,
        },
        notification,
    ))
}

fn delivered_notification(
    transition: &UserTransition,
    persisted: &PersistTransitionResult,
) -> Option<DeliveredNotification> {
    let notification = transition.notification.as_ref()?;
    let notification_id: i64 = persisted.notification_id?;
    Some(DeliveredNotification {
        notification_id,
        user_id: notification.user_id.as_str().to_string(),
        title: notification.title.clone(),
        message: notification.message.clone(),
        kind: notification.kind,
    })
}

fn build_response(
    action: &BulkAction,
    processed_users: Vec<ProcessedUser>,
    notifications: Vec<DeliveredNotification>,
) -> BulkUserActionResponse {
    let count = |status: ProcessStatus| {
        processed_users
            .iter()
            .filter(|entry| entry.status == status)
            .count()
    };
    let success_count: usize = count(ProcessStatus::Success);
    let skipped_count: usize = count(ProcessStatus::Skipped);
    let error_count: usize = count(ProcessStatus::Error);

    let errors: Vec<String> = processed_users
        .iter()
        .filter(|entry| entry.status == ProcessStatus::Error)
        .map(|entry| {
            format!(
                "{}: {}",
                entry.email.as_deref().unwrap_or(&entry.id),
                entry.reason.as_deref().unwrap_or_default()
            )
        })
        .collect();

    let message: String = format!(
        "Bulk action '{}' completed: {success_count} succeeded, {skipped_count} skipped, {error_count} failed",
        action.name()
    );

    info!(
        action = action.name(),
        success_count, skipped_count, error_count, "Bulk user action committed"
    );

    BulkUserActionResponse {
        success: true,
        message,
        statistics: BulkStatistics {
            total_selected: processed_users.len(),
            success_count,
            skipped_count,
            error_count,
            processed_users,
        },
        errors: (!errors.is_empty()).then_some(errors),
        action_message: (success_count > 0).then(|| action.completion_message(success_count)),
        notifications,
    }
}

/// Lists every account.
///
/// # Errors
///
/// Returns an error if the actor is not an administrator or the query fails.
pub fn list_users(
    persistence: &mut Persistence,
    authenticated_actor: &AuthenticatedActor,
) -> Result<ListUsersResponse, ApiError> {
    AuthorizationService::authorize_list_users(authenticated_actor)?;

    let users: Vec<UserData> = persistence.list_users().map_err(|e| ApiError::Internal {
        message: format!("Failed to list users: {e}"),
    })?;

    Ok(ListUsersResponse {
        users: users.into_iter().map(user_info).collect(),
    })
}

fn user_info(user: UserData) -> UserInfo {
    UserInfo {
        user_id: user.user_id,
        email: user.email,
        display_name: user.display_name,
        role: user.role,
        is_active: user.is_active,
        email_verified: user.email_verified,
        program_id: user.program_id,
        created_at: user.created_at,
    }
}

/// Reads the audit trail of one entity, oldest first.
///
/// # Errors
///
/// Returns an error if the actor is not an administrator, the filter is
/// blank, or the query fails.
pub fn list_audit_events(
    persistence: &mut Persistence,
    authenticated_actor: &AuthenticatedActor,
    entity_type: &str,
    entity_id: &str,
) -> Result<ListAuditEventsResponse, ApiError> {
    AuthorizationService::authorize_view_audit(authenticated_actor)?;

    if entity_type.trim().is_empty() {
        return Err(ApiError::InvalidInput {
            field: String::from("entity_type"),
            message: String::from("Entity type cannot be empty"),
        });
    }
    if entity_id.trim().is_empty() {
        return Err(ApiError::InvalidInput {
            field: String::from("entity_id"),
            message: String::from("Entity ID cannot be empty"),
        });
    }

    let events: Vec<AuditEvent> = persistence
        .list_audit_events_for_entity(entity_type.trim(), entity_id.trim())
        .map_err(|e| ApiError::Internal {
            message: format!("Failed to read audit trail: {e}"),
        })?;

    Ok(ListAuditEventsResponse {
        events: events.into_iter().filter_map(audit_event_info).collect(),
    })
}

fn audit_event_info(event: AuditEvent) -> Option<AuditEventInfo> {
    Some(AuditEventInfo {
        event_id: event.event_id?,
        actor_id: event.actor.id,
        actor_email: event.actor.email,
        cause_id: event.cause.id,
        action: event.action.name,
        details: event.action.details,
        entity_type: event.subject.entity_type,
        entity_id: event.subject.entity_id,
        before: event.before.data,
        after: event.after.data,
        created_at: event.created_at,
    })
}

/// Lists the caller's own notifications, newest first.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_notifications(
    persistence: &mut Persistence,
    authenticated_actor: &AuthenticatedActor,
) -> Result<ListNotificationsResponse, ApiError> {
    let notifications: Vec<NotificationData> = persistence
        .list_notifications_for_user(authenticated_actor.user_id.as_str())
        .map_err(|e| ApiError::Internal {
            message: format!("Failed to list notifications: {e}"),
        })?;

    let unread_count: usize = notifications.iter().filter(|n| !n.is_read).count();

    Ok(ListNotificationsResponse {
        notifications: notifications
            .into_iter()
            .map(|n| NotificationInfo {
                notification_id: n.notification_id,
                title: n.title,
                message: n.message,
                notification_type: n.notification_type,
                is_read: n.is_read,
                created_at: n.created_at,
            })
            .collect(),
        unread_count,
    })
}

/// Marks one of the caller's notifications as read.
///
/// Notifications addressed to someone else are reported as not found.
///
/// # Errors
///
/// Returns an error if the notification does not exist, belongs to another
/// user, or the update fails.
pub fn mark_notification_read(
    persistence: &mut Persistence,
    authenticated_actor: &AuthenticatedActor,
    notification_id: i64,
) -> Result<MarkNotificationReadResponse, ApiError> {
    let not_found = || ApiError::ResourceNotFound {
        resource_type: String::from("Notification"),
        message: format!("Notification {notification_id} does not exist"),
    };

    let notification: NotificationData = persistence
        .get_notification(notification_id)
        .map_err(|e| ApiError::Internal {
            message: format!("Failed to load notification: {e}"),
        })?
        .ok_or_else(not_found)?;

    if notification.user_id != authenticated_actor.user_id.as_str() {
        return Err(not_found());
    }

    persistence
        .mark_notification_read(notification_id)
        .map_err(|e| ApiError::Internal {
            message: format!("Failed to mark notification read: {e}"),
        })?;

    Ok(MarkNotificationReadResponse {
        notification_id,
        message: String::from("Notification marked as read"),
    })
}

/// Logs in and returns a session token.
///
/// # Errors
///
/// Returns an error if authentication fails.
pub fn login(
    persistence: &mut Persistence,
    request: &LoginRequest,
) -> Result<LoginResponse, ApiError> {
    let (session_token, actor, user) =
        AuthenticationService::login(persistence, &request.email, &request.password)?;

    Ok(LoginResponse {
        session_token,
        user_id: user.user_id,
        email: user.email,
        role: actor.role.as_str().to_string(),
    })
}

/// Logs out by deleting the session.
///
/// # Errors
///
/// Returns an error if the session cannot be deleted.
pub fn logout(persistence: &mut Persistence, session_token: &str) -> Result<(), ApiError> {
    AuthenticationService::logout(persistence, session_token)?;
    Ok(())
}

/// Describes the caller.
#[must_use]
pub fn whoami(authenticated_actor: &AuthenticatedActor, user: &UserData) -> WhoAmIResponse {
    WhoAmIResponse {
        user_id: authenticated_actor.user_id.as_str().to_string(),
        email: user.email.clone(),
        display_name: user.display_name.clone(),
        role: authenticated_actor.role.as_str().to_string(),
    }
}

/// Creates the first administrator when no accounts exist.
///
/// # Returns
///
/// The new administrator's identifier, or `None` when accounts already exist.
///
/// # Errors
///
/// Returns an error if the input is blank or storage fails.
pub fn bootstrap_admin(
    persistence: &mut Persistence,
    email: &str,
    password: &str,
) -> Result<Option<UserId>, ApiError> {
    let existing: i64 = persistence.count_users().map_err(|e| ApiError::Internal {
        message: format!("Failed to count users: {e}"),
    })?;
    if existing > 0 {
        return Ok(None);
    }

    if email.trim().is_empty() {
        return Err(ApiError::InvalidInput {
            field: String::from("email"),
            message: String::from("Email cannot be empty"),
        });
    }
    if password.is_empty() {
        return Err(ApiError::InvalidInput {
            field: String::from("password"),
            message: String::from("Password cannot be empty"),
        });
    }

    let user_id: UserId = UserId::generate();
    persistence
        .create_user(&NewUser {
            user_id: user_id.as_str(),
            email: email.trim(),
            display_name: "Administrator",
            password,
            role: Role::Admin,
            is_active: true,
            email_verified: true,
        })
        .map_err(|e| ApiError::Internal {
            message: format!("Failed to create administrator: {e}"),
        })?;

    info!(user_id = %user_id, "Seeded first administrator");
    Ok(Some(user_id))
}
