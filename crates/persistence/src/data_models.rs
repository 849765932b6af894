// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use std::str::FromStr;

use admissions::UserState;
use admissions_domain::{Role, UserId};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::error::PersistenceError;

/// Serializable representation of an Actor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActorData {
    pub id: String,
    pub actor_type: String,
    pub email: Option<String>,
}

/// Serializable representation of a Cause.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CauseData {
    pub id: String,
    pub description: String,
}

/// Serializable representation of an Action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionData {
    pub name: String,
    pub details: Option<String>,
}

/// Serializable representation of a `StateSnapshot`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateSnapshotData {
    pub data: String,
}

/// A stored user account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserData {
    pub user_id: String,
    pub email: String,
    pub display_name: String,
    pub password_hash: String,
    pub role: String,
    pub is_active: bool,
    pub email_verified: bool,
    pub program_id: Option<i64>,
    pub password_reset_token: Option<String>,
    pub password_reset_expires_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl UserData {
    /// Builds the state the bulk action rules operate on.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored identifier, role or reset expiry is
    /// invalid.
    pub fn to_user_state(&self) -> Result<UserState, PersistenceError> {
        let user_id: UserId = UserId::new(&self.user_id)
            .map_err(|e| PersistenceError::ReconstructionError(e.to_string()))?;
        let role: Role = Role::from_str(&self.role)
            .map_err(|e| PersistenceError::ReconstructionError(e.to_string()))?;
        let password_reset_expires_at: Option<OffsetDateTime> = self
            .password_reset_expires_at
            .as_deref()
            .map(|value| OffsetDateTime::parse(value, &Rfc3339))
            .transpose()
            .map_err(|e| PersistenceError::ReconstructionError(e.to_string()))?;

        Ok(UserState {
            user_id,
            email: self.email.clone(),
            display_name: self.display_name.clone(),
            role,
            is_active: self.is_active,
            email_verified: self.email_verified,
            password_reset_expires_at,
        })
    }
}

/// A stored login session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionData {
    pub session_id: i64,
    pub session_token: String,
    pub user_id: String,
    pub created_at: String,
    pub last_activity_at: String,
    pub expires_at: String,
}

/// A stored user notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationData {
    pub notification_id: i64,
    pub user_id: String,
    pub title: String,
    pub message: String,
    pub notification_type: String,
    pub is_read: bool,
    pub created_at: String,
}
