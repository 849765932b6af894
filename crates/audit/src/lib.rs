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
    clippy::all
)]
#![allow(clippy::multiple_crate_versions)]

use admissions_domain::UserId;

#[cfg(test)]
mod tests;

/// Entity type recorded for audit events that affect a user account.
pub const USER_ENTITY: &str = "user";

/// Represents the entity performing an action.
///
/// An actor is any identifiable entity that initiates a state change.
/// For account management this is the authenticated admin; the email is
/// captured at the time of the action so the trail stays readable after
/// the account changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    /// The unique identifier for this actor.
    pub id: String,
    /// The type of actor (e.g., "admin", "system").
    pub actor_type: String,
    /// The actor's email at the time of the action, if known.
    pub email: Option<String>,
}

impl Actor {
    /// Creates a new Actor without an email snapshot.
    ///
    /// # Arguments
    ///
    /// * `id` - The unique identifier for this actor
    /// * `actor_type` - The type of actor
    #[must_use]
    pub const fn new(id: String, actor_type: String) -> Self {
        Self {
            id,
            actor_type,
            email: None,
        }
    }

    /// Creates a new Actor for an authenticated user account.
    ///
    /// # Arguments
    ///
    /// * `id` - The user identifier of the actor
    /// * `actor_type` - The type of actor (usually the role)
    /// * `email` - The actor's email at the time of the action
    #[must_use]
    pub const fn with_user(id: String, actor_type: String, email: String) -> Self {
        Self {
            id,
            actor_type,
            email: Some(email),
        }
    }
}

/// Represents the reason or trigger for an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cause {
    /// A unique identifier for this cause (e.g., request ID).
    pub id: String,
    /// A description of the cause.
    pub description: String,
}

impl Cause {
    /// Creates a new Cause.
    #[must_use]
    pub const fn new(id: String, description: String) -> Self {
        Self { id, description }
    }
}

/// Represents the specific action performed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    /// The name of the action (e.g., "`ActivateUser`").
    pub name: String,
    /// Optional additional details about the action.
    pub details: Option<String>,
}

impl Action {
    /// Creates a new Action.
    #[must_use]
    pub const fn new(name: String, details: Option<String>) -> Self {
        Self { name, details }
    }
}

/// The entity an audit event is about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subject {
    /// The kind of entity (e.g., "user").
    pub entity_type: String,
    /// The identifier of the entity.
    pub entity_id: String,
}

impl Subject {
    /// Creates a new Subject.
    #[must_use]
    pub const fn new(entity_type: String, entity_id: String) -> Self {
        Self {
            entity_type,
            entity_id,
        }
    }

    /// Creates a Subject referring to a user account.
    #[must_use]
    pub fn user(user_id: &UserId) -> Self {
        Self::new(USER_ENTITY.to_string(), user_id.as_str().to_string())
    }
}

/// A snapshot of the affected values at a point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateSnapshot {
    /// A string representation of the values.
    pub data: String,
}

impl StateSnapshot {
    /// Creates a new `StateSnapshot`.
    #[must_use]
    pub const fn new(data: String) -> Self {
        Self { data }
    }
}

/// An immutable audit event representing a state transition.
///
/// Every successful state change must produce exactly one audit event.
/// Audit events are append-only and capture:
/// - Who performed the action (actor)
/// - Why it was performed (cause)
/// - What action was performed (action)
/// - Which entity it affected (subject)
/// - The values before and after the transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEvent {
    /// The identifier assigned on persistence. `None` until persisted.
    pub event_id: Option<i64>,
    /// The actor who initiated this state change.
    pub actor: Actor,
    /// The cause or reason for this state change.
    pub cause: Cause,
    /// The action that was performed.
    pub action: Action,
    /// The entity affected by the action.
    pub subject: Subject,
    /// The values before the transition.
    pub before: StateSnapshot,
    /// The values after the transition.
    pub after: StateSnapshot,
    /// When the event was recorded. `None` until persisted.
    pub created_at: Option<String>,
}

impl AuditEvent {
    /// Creates a new, not yet persisted, `AuditEvent`.
    #[must_use]
    pub const fn new(
        actor: Actor,
        cause: Cause,
        action: Action,
        subject: Subject,
        before: StateSnapshot,
        after: StateSnapshot,
    ) -> Self {
        Self {
            event_id: None,
            actor,
            cause,
            action,
            subject,
            before,
            after,
            created_at: None,
        }
    }

    /// Returns a copy of this event carrying its persisted identity.
    #[must_use]
    pub fn persisted(mut self, event_id: i64, created_at: String) -> Self {
        self.event_id = Some(event_id);
        self.created_at = Some(created_at);
        self
    }
}
