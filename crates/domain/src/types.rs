// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::DomainError;

/// Number of random 64-bit words in a password reset token (256 bits).
const RESET_TOKEN_WORDS: usize = 4;

/// Represents a user identifier.
///
/// User identifiers are opaque strings. Identifiers created by the system
/// are UUID v4 values, but any non-blank string is accepted so that
/// externally provisioned accounts keep their original identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(String);

impl UserId {
    /// Creates a `UserId` from a raw string.
    ///
    /// Surrounding whitespace is removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the identifier is blank.
    pub fn new(value: &str) -> Result<Self, DomainError> {
        let trimmed: &str = value.trim();
        if trimmed.is_empty() {
            return Err(DomainError::InvalidUserId(String::from(
                "User ID cannot be empty",
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Generates a fresh random identifier (UUID v4).
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// User roles.
///
/// Every account holds exactly one role. Roles gate what an authenticated
/// user may do and decide which referential blockers apply on deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Portal administrator with authority over every account.
    Admin,
    /// Manages applications and students for the programs assigned to them.
    ProgramAdmin,
    /// Applicant submitting applications to programs.
    Student,
}

impl Role {
    /// All valid roles, in display order.
    pub const ALL: [Self; 3] = [Self::Admin, Self::ProgramAdmin, Self::Student];

    /// Converts this role to its stored string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::ProgramAdmin => "program_admin",
            Self::Student => "student",
        }
    }

    /// Returns a human-readable label for this role.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Admin => "Administrator",
            Self::ProgramAdmin => "Program Admin",
            Self::Student => "Student",
        }
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "admin" => Ok(Self::Admin),
            "program_admin" => Ok(Self::ProgramAdmin),
            "student" => Ok(Self::Student),
            other => Err(DomainError::InvalidRole(other.to_string())),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Severity of a user notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// Neutral information.
    Info,
    /// Something good happened to the account.
    Success,
    /// Something restrictive happened to the account.
    Warning,
}

impl NotificationKind {
    /// Converts this kind to its stored string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Warning => "warning",
        }
    }
}

impl FromStr for NotificationKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "info" => Ok(Self::Info),
            "success" => Ok(Self::Success),
            "warning" => Ok(Self::Warning),
            other => Err(DomainError::InvalidNotificationKind(other.to_string())),
        }
    }
}

/// A password reset token.
///
/// Tokens carry 256 bits from the thread-local CSPRNG, hex encoded
/// (64 characters).
#[derive(Clone, PartialEq, Eq)]
pub struct ResetToken(String);

impl ResetToken {
    /// Generates a new random token.
    #[must_use]
    pub fn generate() -> Self {
        let mut value: String = String::with_capacity(RESET_TOKEN_WORDS * 16);
        for _ in 0..RESET_TOKEN_WORDS {
            value.push_str(&format!("{:016x}", rand::random::<u64>()));
        }
        Self(value)
    }

    /// Returns the token as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Tokens are credentials; keep them out of logs.
impl std::fmt::Debug for ResetToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ResetToken(..)")
    }
}

/// Counts of records that block a user from being deleted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Dependents {
    /// Applications submitted by the user.
    pub applications: i64,
    /// Programs the user is assigned to administer.
    pub assigned_programs: i64,
}

impl Dependents {
    /// Creates a new `Dependents` count.
    #[must_use]
    pub const fn new(applications: i64, assigned_programs: i64) -> Self {
        Self {
            applications,
            assigned_programs,
        }
    }
}
