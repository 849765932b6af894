// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Persistence layer for the Admissions Portal.
//!
//! This crate stores user accounts, the records that reference them
//! (programs, applications, sessions, notifications) and the audit trail.
//! It is built on Diesel over `SQLite`.
//!
//! ## Transactions
//!
//! [`Persistence::in_transaction`] runs work inside a transaction and may be
//! nested: the outermost call opens a transaction, inner calls open
//! savepoints. A bulk action uses one outer transaction for the batch and
//! one savepoint per user, so a failing user is rolled back on its own
//! while the rest of the batch still commits.
//!
//! ## Testing
//!
//! - `new_in_memory()` hands every caller its own shared-cache in-memory
//!   database, so tests never see each other's rows
//! - Foreign key enforcement is verified on every connection

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(clippy::multiple_crate_versions)]

use admissions::UserTransition;
use admissions_audit::AuditEvent;
use admissions_domain::{Dependents, NotificationKind};
use diesel::SqliteConnection;
use diesel::connection::{AnsiTransactionManager, SimpleConnection, TransactionManager};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, warn};

mod backend;
mod data_models;
mod diesel_schema;
mod error;
mod mutations;
mod queries;

#[cfg(test)]
mod tests;

pub use data_models::{NotificationData, SessionData, UserData};
pub use error::{PersistenceError, TransactionError};
pub use mutations::PersistTransitionResult;
pub use mutations::users::NewUser;

use backend::PersistenceBackend;

/// Atomic counter for generating unique in-memory database names.
static DB_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Persistence adapter for accounts, their dependents and the audit trail.
pub struct Persistence {
    pub(crate) conn: SqliteConnection,
    hash_cost: u32,
}

impl Persistence {
    /// Creates a new persistence adapter with an in-memory `SQLite` database.
    ///
    /// Each call receives a unique database instance via atomic counter,
    /// ensuring deterministic test isolation without time-based collisions.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be initialized.
    pub fn new_in_memory() -> Result<Self, PersistenceError> {
        let db_id = DB_COUNTER.fetch_add(1, Ordering::SeqCst);
        let db_name = format!("memdb_test_{db_id}");
        let shared_memory_url = format!("file:{db_name}?mode=memory&cache=shared");

        let mut conn: SqliteConnection = backend::sqlite::initialize_database(&shared_memory_url)?;

        conn.verify_foreign_key_enforcement()?;

        Ok(Self {
            conn,
            hash_cost: bcrypt::DEFAULT_COST,
        })
    }

    /// Creates a new persistence adapter with a file-based `SQLite` database.
    ///
    /// # Arguments
    ///
    /// * `path` - The path to the `SQLite` database file
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or initialized.
    pub fn new_with_file<P: AsRef<Path>>(path: P) -> Result<Self, PersistenceError> {
        let path_str = path.as_ref().to_str().ok_or_else(|| {
            PersistenceError::InitializationError("Invalid database path".to_string())
        })?;

        let mut conn: SqliteConnection = backend::sqlite::initialize_database(path_str)?;

        backend::sqlite::enable_wal_mode(&mut conn)?;

        conn.verify_foreign_key_enforcement()?;

        Ok(Self {
            conn,
            hash_cost: bcrypt::DEFAULT_COST,
        })
    }

    /// Overrides the bcrypt cost used when hashing new passwords.
    ///
    /// bcrypt rejects costs below 4.
    #[must_use]
    pub const fn with_password_hash_cost(mut self, cost: u32) -> Self {
        self.hash_cost = cost;
        self
    }

    /// Verifies that foreign key enforcement is enabled.
    ///
    /// # Errors
    ///
    /// Returns an error if foreign key enforcement is not enabled.
    pub fn verify_foreign_key_enforcement(&mut self) -> Result<(), PersistenceError> {
        self.conn.verify_foreign_key_enforcement()
    }

    // ========================================================================
    // Transactions
    // ========================================================================

    /// Runs `work` inside a transaction.
    ///
    /// The outermost call begins a transaction; calls made from inside
    /// `work` begin savepoints. `Ok` commits (or releases the savepoint),
    /// `Err` rolls back to where this call started.
    ///
    /// # Errors
    ///
    /// - `TransactionError::Aborted` carries the error `work` returned, after
    ///   its changes were rolled back
    /// - `TransactionError::Control` reports a failure to begin, commit or
    ///   roll back. When the commit fails, the work is rolled back before
    ///   the error is returned.
    pub fn in_transaction<T, E, F>(&mut self, work: F) -> Result<T, TransactionError<E>>
    where
        F: FnOnce(&mut Self) -> Result<T, E>,
    {
        let outermost: bool = AnsiTransactionManager::transaction_manager_status_mut(&mut self.conn)
            .transaction_depth()
            .map_err(|e| TransactionError::Control(PersistenceError::from(e)))?
            .is_none();

        AnsiTransactionManager::begin_transaction(&mut self.conn)
            .map_err(|e| TransactionError::Control(PersistenceError::from(e)))?;

        match work(self) {
            Ok(value) => match AnsiTransactionManager::commit_transaction(&mut self.conn) {
                Ok(()) => Ok(value),
                Err(commit_err) => {
                    warn!(error = %commit_err, outermost, "Transaction commit failed");
                    if outermost {
                        self.discard_failed_commit();
                    }
                    Err(TransactionError::Control(PersistenceError::from(commit_err)))
                }
            },
            Err(err) => {
                AnsiTransactionManager::rollback_transaction(&mut self.conn)
                    .map_err(|e| TransactionError::Control(PersistenceError::from(e)))?;
                Err(TransactionError::Aborted(err))
            }
        }
    }

    /// Ends a transaction whose COMMIT failed.
    ///
    /// `SQLite` keeps the transaction open after a failed COMMIT (for example
    /// on a deferred foreign key violation), while diesel may already have
    /// reset its own depth.
    fn discard_failed_commit(&mut self) {
        if AnsiTransactionManager::rollback_transaction(&mut self.conn).is_ok() {
            return;
        }
        if let Err(err) = self.conn.batch_execute("ROLLBACK") {
            debug!(error = %err, "No open transaction after failed commit");
        }
    }

    /// Executes raw SQL on the underlying connection.
    ///
    /// Only available with the `test-support` feature.
    ///
    /// # Errors
    ///
    /// Returns an error if the statement fails.
    #[cfg(feature = "test-support")]
    pub fn execute_raw_sql(&mut self, sql: &str) -> Result<(), PersistenceError> {
        self.conn.batch_execute(sql)?;
        Ok(())
    }

    /// Persists the transition decided for one user.
    ///
    /// Callers are expected to wrap this in [`Self::in_transaction`].
    ///
    /// # Errors
    ///
    /// Returns the first storage error encountered.
    pub fn persist_user_transition(
        &mut self,
        transition: &UserTransition,
    ) -> Result<PersistTransitionResult, PersistenceError> {
        mutations::persist_user_transition(&mut self.conn, transition)
    }

    // ========================================================================
    // Users
    // ========================================================================

    /// Creates a user account.
    ///
    /// # Errors
    ///
    /// Returns an error if hashing or the insert fails.
    pub fn create_user(&mut self, new_user: &NewUser<'_>) -> Result<(), PersistenceError> {
        mutations::users::create_user(&mut self.conn, new_user, self.hash_cost)
    }

    /// Retrieves a user by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn get_user_by_id(&mut self, user_id: &str) -> Result<Option<UserData>, PersistenceError> {
        queries::users::get_user_by_id(&mut self.conn, user_id)
    }

    /// Retrieves a user by email address.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn get_user_by_email(&mut self, email: &str) -> Result<Option<UserData>, PersistenceError> {
        queries::users::get_user_by_email(&mut self.conn, email)
    }

    /// Lists all users.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn list_users(&mut self) -> Result<Vec<UserData>, PersistenceError> {
        queries::users::list_users(&mut self.conn)
    }

    /// Counts all users.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn count_users(&mut self) -> Result<i64, PersistenceError> {
        queries::users::count_users(&mut self.conn)
    }

    /// Counts the records that block deletion of a user.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn count_dependents(&mut self, user_id: &str) -> Result<Dependents, PersistenceError> {
        queries::users::count_dependents(&mut self.conn, user_id)
    }

    /// Assigns a user to a program, or clears the assignment.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails or the user does not exist.
    pub fn set_user_program(
        &mut self,
        user_id: &str,
        program_id: Option<i64>,
    ) -> Result<(), PersistenceError> {
        mutations::users::set_program(&mut self.conn, user_id, program_id)
    }

    /// Verifies a password against a stored hash.
    ///
    /// # Errors
    ///
    /// Returns an error if password verification fails.
    pub fn verify_password(password: &str, password_hash: &str) -> Result<bool, PersistenceError> {
        queries::users::verify_password(password, password_hash)
    }

    // ========================================================================
    // Programs & Applications
    // ========================================================================

    /// Creates a program, optionally administered by a user.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub fn create_program(
        &mut self,
        program_name: &str,
        admin_user_id: Option<&str>,
    ) -> Result<i64, PersistenceError> {
        mutations::programs::create_program(&mut self.conn, program_name, admin_user_id)
    }

    /// Records an application from a user to a program.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub fn create_application(
        &mut self,
        user_id: &str,
        program_id: i64,
    ) -> Result<i64, PersistenceError> {
        mutations::programs::create_application(&mut self.conn, user_id, program_id)
    }

    // ========================================================================
    // Sessions
    // ========================================================================

    /// Creates a new session.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be created.
    pub fn create_session(
        &mut self,
        session_token: &str,
        user_id: &str,
        expires_at: &str,
    ) -> Result<i64, PersistenceError> {
        mutations::sessions::create_session(&mut self.conn, session_token, user_id, expires_at)
    }

    /// Retrieves a session by token.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn get_session_by_token(
        &mut self,
        session_token: &str,
    ) -> Result<Option<SessionData>, PersistenceError> {
        queries::sessions::get_session_by_token(&mut self.conn, session_token)
    }

    /// Counts the sessions belonging to a user.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn count_sessions_for_user(&mut self, user_id: &str) -> Result<i64, PersistenceError> {
        queries::sessions::count_sessions_for_user(&mut self.conn, user_id)
    }

    /// Updates the last activity timestamp for a session.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub fn update_session_activity(&mut self, session_id: i64) -> Result<(), PersistenceError> {
        mutations::sessions::update_session_activity(&mut self.conn, session_id)
    }

    /// Deletes a session by token.
    ///
    /// # Errors
    ///
    /// Returns an error if the database delete fails.
    pub fn delete_session(&mut self, session_token: &str) -> Result<usize, PersistenceError> {
        mutations::sessions::delete_session(&mut self.conn, session_token)
    }

    /// Deletes every session belonging to a user.
    ///
    /// # Errors
    ///
    /// Returns an error if the database delete fails.
    pub fn delete_sessions_for_user(&mut self, user_id: &str) -> Result<usize, PersistenceError> {
        mutations::sessions::delete_sessions_for_user(&mut self.conn, user_id)
    }

    /// Deletes all sessions that expired before `now` (ISO 8601).
    ///
    /// # Errors
    ///
    /// Returns an error if the database delete fails.
    pub fn delete_expired_sessions(&mut self, now: &str) -> Result<usize, PersistenceError> {
        mutations::sessions::delete_expired_sessions(&mut self.conn, now)
    }

    // ========================================================================
    // Notifications
    // ========================================================================

    /// Adds a notification to a user's inbox.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub fn insert_notification(
        &mut self,
        user_id: &str,
        title: &str,
        message: &str,
        kind: NotificationKind,
    ) -> Result<i64, PersistenceError> {
        mutations::notifications::insert_notification(&mut self.conn, user_id, title, message, kind)
    }

    /// Retrieves a notification by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn get_notification(
        &mut self,
        notification_id: i64,
    ) -> Result<Option<NotificationData>, PersistenceError> {
        queries::notifications::get_notification(&mut self.conn, notification_id)
    }

    /// Lists the notifications addressed to a user, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn list_notifications_for_user(
        &mut self,
        user_id: &str,
    ) -> Result<Vec<NotificationData>, PersistenceError> {
        queries::notifications::list_notifications_for_user(&mut self.conn, user_id)
    }

    /// Counts the notifications addressed to a user.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn count_notifications_for_user(&mut self, user_id: &str) -> Result<i64, PersistenceError> {
        queries::notifications::count_notifications_for_user(&mut self.conn, user_id)
    }

    /// Marks a notification as read.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails or the notification does not exist.
    pub fn mark_notification_read(&mut self, notification_id: i64) -> Result<(), PersistenceError> {
        mutations::notifications::mark_notification_read(&mut self.conn, notification_id)
    }

    // ========================================================================
    // Audit Events
    // ========================================================================

    /// Persists an audit event.
    ///
    /// # Errors
    ///
    /// Returns an error if persistence fails.
    pub fn persist_audit_event(&mut self, event: &AuditEvent) -> Result<i64, PersistenceError> {
        mutations::audit::persist_audit_event(&mut self.conn, event)
    }

    /// Retrieves an audit event by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the event is not found or cannot be deserialized.
    pub fn get_audit_event(&mut self, event_id: i64) -> Result<AuditEvent, PersistenceError> {
        queries::audit::get_audit_event(&mut self.conn, event_id)
    }

    /// Retrieves every audit event about one entity, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if events cannot be retrieved or deserialized.
    pub fn list_audit_events_for_entity(
        &mut self,
        entity_type: &str,
        entity_id: &str,
    ) -> Result<Vec<AuditEvent>, PersistenceError> {
        queries::audit::list_audit_events_for_entity(&mut self.conn, entity_type, entity_id)
    }

    /// Retrieves the most recent audit events, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if events cannot be retrieved or deserialized.
    pub fn list_recent_audit_events(
        &mut self,
        limit: i64,
    ) -> Result<Vec<AuditEvent>, PersistenceError> {
        queries::audit::list_recent_audit_events(&mut self.conn, limit)
    }

    /// Counts all audit events.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn count_audit_events(&mut self) -> Result<i64, PersistenceError> {
        queries::audit::count_audit_events(&mut self.conn)
    }
}
