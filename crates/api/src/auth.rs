// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Authentication and authorization types and services.

use std::str::FromStr;

use admissions_audit::Actor;
use admissions_domain::{Role, UserId};
use admissions_persistence::{Persistence, PersistenceError, SessionData, UserData};
use time::format_description::well_known::Rfc3339;
use time::{Duration, OffsetDateTime};
use tracing::{debug, info};

use crate::error::AuthError;

/// Number of random 64-bit words in a session token.
const SESSION_TOKEN_WORDS: usize = 4;

/// An authenticated user with an associated role.
///
/// The processor never reads ambient request state; handlers receive the
/// acting user through this value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedActor {
    /// The identifier of the authenticated user.
    pub user_id: UserId,
    /// The role held at authentication time.
    pub role: Role,
}

impl AuthenticatedActor {
    /// Creates a new authenticated actor.
    #[must_use]
    pub const fn new(user_id: UserId, role: Role) -> Self {
        Self { user_id, role }
    }

    /// Converts this authenticated actor into an audit Actor.
    ///
    /// # Arguments
    ///
    /// * `user` - The stored account, used for the email snapshot
    #[must_use]
    pub fn to_audit_actor(&self, user: &UserData) -> Actor {
        Actor::with_user(
            self.user_id.as_str().to_string(),
            self.role.as_str().to_string(),
            user.email.clone(),
        )
    }
}

/// Authorization service for enforcing role-based access control.
pub struct AuthorizationService;

impl AuthorizationService {
    fn require_admin(actor: &AuthenticatedActor, action: &str) -> Result<(), AuthError> {
        match actor.role {
            Role::Admin => Ok(()),
            Role::ProgramAdmin | Role::Student => Err(AuthError::Unauthorized {
                action: action.to_string(),
                required_role: Role::Admin.label().to_string(),
            }),
        }
    }

    /// Checks if an actor may run bulk account actions.
    ///
    /// Only administrators may.
    ///
    /// # Errors
    ///
    /// Returns an error if the actor is not an administrator.
    pub fn authorize_bulk_user_action(actor: &AuthenticatedActor) -> Result<(), AuthError> {
        Self::require_admin(actor, "bulk_user_action")
    }

    /// Checks if an actor may list every account.
    ///
    /// # Errors
    ///
    /// Returns an error if the actor is not an administrator.
    pub fn authorize_list_users(actor: &AuthenticatedActor) -> Result<(), AuthError> {
        Self::require_admin(actor, "list_users")
    }

    /// Checks if an actor may read the audit trail.
    ///
    /// # Errors
    ///
    /// Returns an error if the actor is not an administrator.
    pub fn authorize_view_audit(actor: &AuthenticatedActor) -> Result<(), AuthError> {
        Self::require_admin(actor, "view_audit")
    }
}

/// Authentication service for bearer session tokens.
pub struct AuthenticationService;

impl AuthenticationService {
    /// Default session expiration duration (30 days).
    const DEFAULT_SESSION_EXPIRATION: Duration = Duration::days(30);

    /// Checks credentials and creates a session.
    ///
    /// # Returns
    ///
    /// A tuple of (`session_token`, `authenticated_actor`, `user_data`)
    ///
    /// # Errors
    ///
    /// Returns an error if the credentials are wrong, the account is
    /// inactive, or the session cannot be stored.
    pub fn login(
        persistence: &mut Persistence,
        email: &str,
        password: &str,
    ) -> Result<(String, AuthenticatedActor, UserData), AuthError> {
        let user: UserData = persistence
            .get_user_by_email(email)
            .map_err(Self::map_persistence_error)?
            .ok_or_else(|| AuthError::AuthenticationFailed {
                reason: String::from("Invalid email or password"),
            })?;

        let password_matches: bool = Persistence::verify_password(password, &user.password_hash)
            .map_err(Self::map_persistence_error)?;
        if !password_matches {
            return Err(AuthError::AuthenticationFailed {
                reason: String::from("Invalid email or password"),
            });
        }

        if !user.is_active {
            return Err(AuthError::AuthenticationFailed {
                reason: String::from("Account is inactive"),
            });
        }

        let actor: AuthenticatedActor = Self::actor_for(&user)?;

        let session_token: String = Self::generate_session_token();
        let expires_at: String =
            Self::format_timestamp(OffsetDateTime::now_utc() + Self::DEFAULT_SESSION_EXPIRATION)?;

        persistence
            .create_session(&session_token, &user.user_id, &expires_at)
            .map_err(|e| AuthError::AuthenticationFailed {
                reason: format!("Failed to create session: {e}"),
            })?;

        info!(user_id = %user.user_id, "User logged in");
        Ok((session_token, actor, user))
    }

    /// Validates a session token and returns the authenticated actor.
    ///
    /// # Returns
    ///
    /// A tuple of (`authenticated_actor`, `user_data`)
    ///
    /// # Errors
    ///
    /// Returns an error if the session is unknown or expired, or the account
    /// is gone or inactive.
    pub fn validate_session(
        persistence: &mut Persistence,
        session_token: &str,
    ) -> Result<(AuthenticatedActor, UserData), AuthError> {
        let session: SessionData = persistence
            .get_session_by_token(session_token)
            .map_err(Self::map_persistence_error)?
            .ok_or_else(|| AuthError::AuthenticationFailed {
                reason: String::from("Invalid session token"),
            })?;

        let expires_at: OffsetDateTime = OffsetDateTime::parse(&session.expires_at, &Rfc3339)
            .map_err(|e| AuthError::AuthenticationFailed {
                reason: format!("Failed to parse session expiration: {e}"),
            })?;

        if OffsetDateTime::now_utc() > expires_at {
            return Err(AuthError::AuthenticationFailed {
                reason: String::from("Session expired"),
            });
        }

        let user: UserData = persistence
            .get_user_by_id(&session.user_id)
            .map_err(Self::map_persistence_error)?
            .ok_or_else(|| AuthError::AuthenticationFailed {
                reason: String::from("User not found"),
            })?;

        if !user.is_active {
            return Err(AuthError::AuthenticationFailed {
                reason: String::from("Account is inactive"),
            });
        }

        let actor: AuthenticatedActor = Self::actor_for(&user)?;

        persistence
            .update_session_activity(session.session_id)
            .map_err(Self::map_persistence_error)?;

        debug!(user_id = %user.user_id, "Session validated");
        Ok((actor, user))
    }

    /// Logs out by deleting the session.
    ///
    /// # Errors
    ///
    /// Returns an error if the logout fails.
    pub fn logout(persistence: &mut Persistence, session_token: &str) -> Result<(), AuthError> {
        persistence
            .delete_session(session_token)
            .map_err(|e| AuthError::AuthenticationFailed {
                reason: format!("Failed to delete session: {e}"),
            })?;

        Ok(())
    }

    /// Removes sessions whose expiry has passed.
    ///
    /// # Errors
    ///
    /// Returns an error if the cleanup fails.
    pub fn purge_expired_sessions(persistence: &mut Persistence) -> Result<usize, AuthError> {
        let now: String = Self::format_timestamp(OffsetDateTime::now_utc())?;
        persistence
            .delete_expired_sessions(&now)
            .map_err(Self::map_persistence_error)
    }

    fn actor_for(user: &UserData) -> Result<AuthenticatedActor, AuthError> {
        let user_id: UserId =
            UserId::new(&user.user_id).map_err(|e| AuthError::AuthenticationFailed {
                reason: e.to_string(),
            })?;
        let role: Role = Role::from_str(&user.role).map_err(|e| AuthError::AuthenticationFailed {
            reason: e.to_string(),
        })?;
        Ok(AuthenticatedActor::new(user_id, role))
    }

    fn format_timestamp(at: OffsetDateTime) -> Result<String, AuthError> {
        at.format(&Rfc3339)
            .map_err(|e| AuthError::AuthenticationFailed {
                reason: format!("Failed to format timestamp: {e}"),
            })
    }

    /// Generates a 256-bit random session token.
    fn generate_session_token() -> String {
        let mut token: String = String::with_capacity(SESSION_TOKEN_WORDS * 16);
        for _ in 0..SESSION_TOKEN_WORDS {
            token.push_str(&format!("{:016x}", rand::random::<u64>()));
        }
        token
    }

    /// Maps persistence errors to authentication errors.
    fn map_persistence_error(err: PersistenceError) -> AuthError {
        AuthError::AuthenticationFailed {
            reason: format!("Database error: {err}"),
        }
    }
}
