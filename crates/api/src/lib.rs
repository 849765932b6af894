// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(clippy::multiple_crate_versions)]

mod auth;
mod error;
mod handlers;
mod request_response;

#[cfg(test)]
mod tests;

pub use auth::{AuthenticatedActor, AuthenticationService, AuthorizationService};
pub use error::{ApiError, AuthError, translate_core_error, translate_domain_error};
pub use handlers::{
    BulkActionConfig, bootstrap_admin, bulk_user_action, list_audit_events, list_notifications,
    list_users, login, logout, mark_notification_read, whoami,
};
pub use request_response::{
    AuditEventInfo, BulkStatistics, BulkUserActionRequest, BulkUserActionResponse,
    DeliveredNotification, ListAuditEventsResponse, ListNotificationsResponse, ListUsersResponse,
    LoginRequest, LoginResponse, MarkNotificationReadResponse, NotificationInfo, ProcessStatus,
    ProcessedUser, UserInfo, WhoAmIResponse,
};
