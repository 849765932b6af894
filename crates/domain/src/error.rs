// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

/// Errors that can occur during domain validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    /// The action name is empty or unknown.
    #[error("Invalid action: {0}")]
    InvalidAction(String),
    /// The role is not one of the valid roles.
    #[error("Invalid role '{0}'. Must be one of: admin, program_admin, student")]
    InvalidRole(String),
    /// A role change was requested without a target role.
    #[error("A new role is required for change_role")]
    MissingNewRole,
    /// The user identifier is empty or invalid.
    #[error("Invalid user ID: {0}")]
    InvalidUserId(String),
    /// The notification kind is unknown.
    #[error("Invalid notification kind: {0}")]
    InvalidNotificationKind(String),
    /// No users were selected.
    #[error("No users selected")]
    EmptyTargetList,
    /// Every selected user was the acting admin.
    #[error("You cannot perform bulk actions on your own account")]
    SelfModificationOnly,
    /// The selection exceeds the configured batch bound.
    #[error("Too many users selected: {size} (maximum {max})")]
    BatchTooLarge {
        /// The number of users selected.
        size: usize,
        /// The maximum allowed batch size.
        max: usize,
    },
    /// The user does not exist. Carries the identifier that was looked up.
    #[error("User not found")]
    UserNotFound(String),
    /// The user still owns applications.
    #[error("Cannot delete user with {count} existing application(s)")]
    UserHasApplications {
        /// Number of applications blocking deletion.
        count: i64,
    },
    /// The program admin is still assigned to programs.
    #[error("Cannot delete program admin assigned to {count} program(s)")]
    ProgramAdminHasPrograms {
        /// Number of programs blocking deletion.
        count: i64,
    },
}
