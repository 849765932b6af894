// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use std::str::FromStr;

use admissions_domain::{DomainError, Role};

/// A bulk account action, as data only.
///
/// Each variant is handled by exactly one policy function in `apply`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkAction {
    /// Mark accounts as active.
    Activate,
    /// Mark accounts as inactive and end their sessions.
    Deactivate,
    /// Remove accounts that nothing references.
    Delete,
    /// Issue a fresh password reset token.
    SendPasswordReset,
    /// Move accounts to another role.
    ChangeRole {
        /// The role every target should end up with.
        new_role: Role,
    },
    /// Mark email addresses as verified.
    VerifyEmail,
}

impl BulkAction {
    /// Parses an action name and, for `change_role`, the target role.
    ///
    /// # Arguments
    ///
    /// * `action` - The action name as submitted
    /// * `new_role` - The target role (only read for `change_role`)
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The action name is empty or unknown
    /// - `change_role` is missing a role or names an invalid one
    pub fn parse(action: &str, new_role: Option<&str>) -> Result<Self, DomainError> {
        match action.trim() {
            "" => Err(DomainError::InvalidAction(String::from(
                "No action specified",
            ))),
            "activate" => Ok(Self::Activate),
            "deactivate" => Ok(Self::Deactivate),
            "delete" => Ok(Self::Delete),
            "send_password_reset" => Ok(Self::SendPasswordReset),
            "verify_email" => Ok(Self::VerifyEmail),
            "change_role" => {
                let raw_role: &str = new_role
                    .map(str::trim)
                    .filter(|role| !role.is_empty())
                    .ok_or(DomainError::MissingNewRole)?;
                Ok(Self::ChangeRole {
                    new_role: Role::from_str(raw_role)?,
                })
            }
            other => Err(DomainError::InvalidAction(format!(
                "Unknown action '{other}'"
            ))),
        }
    }

    /// Returns the wire name of this action.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Activate => "activate",
            Self::Deactivate => "deactivate",
            Self::Delete => "delete",
            Self::SendPasswordReset => "send_password_reset",
            Self::ChangeRole { .. } => "change_role",
            Self::VerifyEmail => "verify_email",
        }
    }

    /// Returns the name recorded in audit events for this action.
    #[must_use]
    pub const fn audit_name(&self) -> &'static str {
        match self {
            Self::Activate => "ActivateUser",
            Self::Deactivate => "DeactivateUser",
            Self::Delete => "DeleteUser",
            Self::SendPasswordReset => "SendPasswordReset",
            Self::ChangeRole { .. } => "ChangeUserRole",
            Self::VerifyEmail => "VerifyUserEmail",
        }
    }

    /// Whether deciding this action needs the user's dependent record counts.
    #[must_use]
    pub const fn requires_dependents(&self) -> bool {
        matches!(self, Self::Delete)
    }

    /// Describes what happened to `count` successfully processed users.
    #[must_use]
    pub fn completion_message(&self, count: usize) -> String {
        match self {
            Self::Activate => format!("{count} user(s) activated"),
            Self::Deactivate => format!("{count} user(s) deactivated and signed out"),
            Self::Delete => format!("{count} user(s) permanently deleted"),
            Self::SendPasswordReset => {
                format!("Password reset tokens issued for {count} user(s), valid for 24 hours")
            }
            Self::ChangeRole { new_role } => {
                format!("{count} user(s) moved to role {}", new_role.label())
            }
            Self::VerifyEmail => format!("{count} email address(es) marked as verified"),
        }
    }
}

impl std::fmt::Display for BulkAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
