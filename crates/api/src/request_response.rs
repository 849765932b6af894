// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! API request and response data transfer objects.

use admissions_domain::NotificationKind;

/// API request to run one action against a set of users.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct BulkUserActionRequest {
    /// The action name (e.g., "deactivate").
    pub action: String,
    /// The identifiers of the selected users.
    pub user_ids: Vec<String>,
    /// Whether affected users receive an in-app notification.
    #[serde(default)]
    pub send_notification: bool,
    /// The target role. Required for `change_role`.
    #[serde(default)]
    pub new_role: Option<String>,
}

/// How a single selected user was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessStatus {
    /// The action was applied.
    Success,
    /// The user was already in the requested state.
    Skipped,
    /// The action could not be applied to this user.
    Error,
}

/// The per-user result entry of a bulk request.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ProcessedUser {
    /// The user identifier as processed.
    pub id: String,
    /// The user's email, when the user could be loaded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// The action name.
    pub action: String,
    /// The outcome for this user.
    pub status: ProcessStatus,
    /// Why the user was skipped or failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Counters for a processed bulk request.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct BulkStatistics {
    /// Number of users processed after normalization.
    pub total_selected: usize,
    /// Users the action was applied to.
    pub success_count: usize,
    /// Users already in the requested state.
    pub skipped_count: usize,
    /// Users the action failed for.
    pub error_count: usize,
    /// One entry per processed user, in request order.
    pub processed_users: Vec<ProcessedUser>,
}

/// A notification written during a bulk request, for live delivery.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DeliveredNotification {
    /// The stored notification identifier.
    pub notification_id: i64,
    /// The recipient.
    pub user_id: String,
    /// The notification title.
    pub title: String,
    /// The notification body.
    pub message: String,
    /// The notification severity.
    pub kind: NotificationKind,
}

/// API response for a processed bulk request.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct BulkUserActionResponse {
    /// Whether the batch committed.
    pub success: bool,
    /// A summary of the outcome.
    pub message: String,
    /// Outcome counters and per-user entries.
    pub statistics: BulkStatistics,
    /// One `"<email or id>: <reason>"` line per failed user.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
    /// The completion message, present when at least one user succeeded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_message: Option<String>,
    /// Notifications written by this request. Not part of the wire format.
    #[serde(skip)]
    pub notifications: Vec<DeliveredNotification>,
}

/// Information about a single account.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct UserInfo {
    /// The user identifier.
    pub user_id: String,
    /// The login email.
    pub email: String,
    /// The display name.
    pub display_name: String,
    /// The role.
    pub role: String,
    /// Whether the account may log in.
    pub is_active: bool,
    /// Whether the email address has been verified.
    pub email_verified: bool,
    /// The program the account is associated with, if any.
    pub program_id: Option<i64>,
    /// When the account was created.
    pub created_at: String,
}

/// API response for listing accounts.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ListUsersResponse {
    /// The accounts, ordered by email.
    pub users: Vec<UserInfo>,
}

/// A single audit trail entry.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AuditEventInfo {
    /// The event identifier.
    pub event_id: i64,
    /// Who performed the action.
    pub actor_id: String,
    /// The actor's email at the time of the action.
    pub actor_email: Option<String>,
    /// The request that caused the action.
    pub cause_id: String,
    /// The action name (e.g., `DeactivateUser`).
    pub action: String,
    /// Additional action details.
    pub details: Option<String>,
    /// The kind of entity affected.
    pub entity_type: String,
    /// The affected entity.
    pub entity_id: String,
    /// The values before the action.
    pub before: String,
    /// The values after the action.
    pub after: String,
    /// When the event was recorded.
    pub created_at: Option<String>,
}

/// API response for reading the audit trail.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ListAuditEventsResponse {
    /// The events.
    pub events: Vec<AuditEventInfo>,
}

/// A notification in a user's inbox.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct NotificationInfo {
    /// The notification identifier.
    pub notification_id: i64,
    /// The notification title.
    pub title: String,
    /// The notification body.
    pub message: String,
    /// The notification severity.
    pub notification_type: String,
    /// Whether the user has read it.
    pub is_read: bool,
    /// When it was created.
    pub created_at: String,
}

/// API response for listing the caller's notifications.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ListNotificationsResponse {
    /// The notifications, newest first.
    pub notifications: Vec<NotificationInfo>,
    /// How many are unread.
    pub unread_count: usize,
}

/// API response for marking a notification read.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct MarkNotificationReadResponse {
    /// The notification identifier.
    pub notification_id: i64,
    /// A success message.
    pub message: String,
}

/// Login request.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct LoginRequest {
    /// The login email.
    pub email: String,
    /// The password.
    pub password: String,
}

/// Login response.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct LoginResponse {
    /// The bearer session token.
    pub session_token: String,
    /// The authenticated user.
    pub user_id: String,
    /// The login email.
    pub email: String,
    /// The role.
    pub role: String,
}

/// Response describing the caller.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct WhoAmIResponse {
    /// The user identifier.
    pub user_id: String,
    /// The login email.
    pub email: String,
    /// The display name.
    pub display_name: String,
    /// The role.
    pub role: String,
}
