// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! User account queries.

use admissions_domain::Dependents;
use diesel::SqliteConnection;
use diesel::dsl::count;
use diesel::prelude::*;
use tracing::debug;

use crate::data_models::UserData;
use crate::diesel_schema::{applications, programs, users};
use crate::error::PersistenceError;

/// Diesel Queryable struct for user rows.
#[derive(Queryable, Selectable)]
#[diesel(table_name = users)]
struct UserRow {
    user_id: String,
    email: String,
    display_name: String,
    password_hash: String,
    role: String,
    is_active: i32,
    email_verified: i32,
    program_id: Option<i64>,
    password_reset_token: Option<String>,
    password_reset_expires_at: Option<String>,
    created_at: String,
    updated_at: String,
}

impl From<UserRow> for UserData {
    fn from(row: UserRow) -> Self {
        Self {
            user_id: row.user_id,
            email: row.email,
            display_name: row.display_name,
            password_hash: row.password_hash,
            role: row.role,
            is_active: row.is_active != 0,
            email_verified: row.email_verified != 0,
            program_id: row.program_id,
            password_reset_token: row.password_reset_token,
            password_reset_expires_at: row.password_reset_expires_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Retrieves a user by ID.
///
/// # Errors
///
/// Returns an error if the database query fails.
/// Returns `Ok(None)` if the user is not found.
pub fn get_user_by_id(
    conn: &mut SqliteConnection,
    user_id: &str,
) -> Result<Option<UserData>, PersistenceError> {
    debug!(user_id, "Looking up user by ID");

    let result: Result<UserRow, diesel::result::Error> = users::table
        .filter(users::user_id.eq(user_id))
        .select(UserRow::as_select())
        .first(conn);

    match result {
        Ok(row) => Ok(Some(UserData::from(row))),
        Err(diesel::result::Error::NotFound) => Ok(None),
        Err(e) => Err(PersistenceError::from(e)),
    }
}

/// Retrieves a user by email address.
///
/// Emails are compared case-insensitively.
///
/// # Errors
///
/// Returns an error if the database query fails.
/// Returns `Ok(None)` if the user is not found.
pub fn get_user_by_email(
    conn: &mut SqliteConnection,
    email: &str,
) -> Result<Option<UserData>, PersistenceError> {
    let normalized_email: String = email.trim().to_lowercase();

    debug!("Looking up user by email: {}", normalized_email);

    let result: Result<UserRow, diesel::result::Error> = users::table
        .filter(users::email.eq(&normalized_email))
        .select(UserRow::as_select())
        .first(conn);

    match result {
        Ok(row) => Ok(Some(UserData::from(row))),
        Err(diesel::result::Error::NotFound) => Ok(None),
        Err(e) => Err(PersistenceError::from(e)),
    }
}

/// Lists all users ordered by email.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn list_users(conn: &mut SqliteConnection) -> Result<Vec<UserData>, PersistenceError> {
    debug!("Listing all users");

    let rows: Vec<UserRow> = users::table
        .select(UserRow::as_select())
        .order_by(users::email.asc())
        .load(conn)?;

    Ok(rows.into_iter().map(UserData::from).collect())
}

/// Counts all users.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn count_users(conn: &mut SqliteConnection) -> Result<i64, PersistenceError> {
    let total: i64 = users::table.select(count(users::user_id)).first(conn)?;
    debug!(total, "Counted users");
    Ok(total)
}

/// Counts the records that block deletion of a user.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn count_dependents(
    conn: &mut SqliteConnection,
    user_id: &str,
) -> Result<Dependents, PersistenceError> {
    let application_count: i64 = applications::table
        .filter(applications::user_id.eq(user_id))
        .select(count(applications::application_id))
        .first(conn)?;

    let program_count: i64 = programs::table
        .filter(programs::admin_user_id.eq(user_id))
        .select(count(programs::program_id))
        .first(conn)?;

    debug!(
        user_id,
        application_count, program_count, "Counted dependent records"
    );
    Ok(Dependents::new(application_count, program_count))
}

/// Verifies a password against a stored hash.
///
/// # Errors
///
/// Returns an error if password verification fails.
pub fn verify_password(password: &str, password_hash: &str) -> Result<bool, PersistenceError> {
    bcrypt::verify(password, password_hash)
        .map_err(|e| PersistenceError::Other(format!("Failed to verify password: {e}")))
}
