// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! User account mutations.
//!
//! Every update refreshes `updated_at` and reports whether a row was
//! touched, so callers can tell a vanished account from a no-op.

use admissions_domain::Role;
use diesel::SqliteConnection;
use diesel::prelude::*;
use tracing::{debug, info};

use crate::diesel_schema::users;
use crate::error::PersistenceError;
use crate::mutations::now_sql;

/// The fields needed to create an account.
#[derive(Debug, Clone, Copy)]
pub struct NewUser<'a> {
    pub user_id: &'a str,
    pub email: &'a str,
    pub display_name: &'a str,
    pub password: &'a str,
    pub role: Role,
    pub is_active: bool,
    pub email_verified: bool,
}

fn require_row(rows_affected: usize, user_id: &str) -> Result<(), PersistenceError> {
    if rows_affected == 0 {
        return Err(PersistenceError::UserNotFound(user_id.to_string()));
    }
    Ok(())
}

/// Creates a new user account.
///
/// The email is normalized to lowercase for case-insensitive uniqueness.
///
/// # Arguments
///
/// * `conn` - The database connection
/// * `new_user` - The account fields; the password is hashed here
/// * `hash_cost` - The bcrypt cost factor
///
/// # Errors
///
/// Returns an error if the password cannot be hashed, or the insert fails
/// (for example on a duplicate email).
pub fn create_user(
    conn: &mut SqliteConnection,
    new_user: &NewUser<'_>,
    hash_cost: u32,
) -> Result<(), PersistenceError> {
    let normalized_email: String = new_user.email.trim().to_lowercase();

    info!(
        user_id = new_user.user_id,
        email = %normalized_email,
        role = %new_user.role,
        "Creating user"
    );

    let password_hash: String = bcrypt::hash(new_user.password, hash_cost)
        .map_err(|e| PersistenceError::Other(format!("Failed to hash password: {e}")))?;

    diesel::insert_into(users::table)
        .values((
            users::user_id.eq(new_user.user_id),
            users::email.eq(&normalized_email),
            users::display_name.eq(new_user.display_name),
            users::password_hash.eq(&password_hash),
            users::role.eq(new_user.role.as_str()),
            users::is_active.eq(i32::from(new_user.is_active)),
            users::email_verified.eq(i32::from(new_user.email_verified)),
        ))
        .execute(conn)?;

    Ok(())
}

/// Sets the active flag of a user.
///
/// # Errors
///
/// Returns an error if the update fails or the user does not exist.
pub fn set_active(
    conn: &mut SqliteConnection,
    user_id: &str,
    is_active: bool,
) -> Result<(), PersistenceError> {
    info!(user_id, is_active, "Setting user active flag");

    let rows_affected: usize = diesel::update(users::table)
        .filter(users::user_id.eq(user_id))
        .set((
            users::is_active.eq(i32::from(is_active)),
            users::updated_at.eq(now_sql()),
        ))
        .execute(conn)?;

    require_row(rows_affected, user_id)
}

/// Sets the email verified flag of a user.
///
/// # Errors
///
/// Returns an error if the update fails or the user does not exist.
pub fn set_email_verified(
    conn: &mut SqliteConnection,
    user_id: &str,
    email_verified: bool,
) -> Result<(), PersistenceError> {
    info!(user_id, email_verified, "Setting user email verified flag");

    let rows_affected: usize = diesel::update(users::table)
        .filter(users::user_id.eq(user_id))
        .set((
            users::email_verified.eq(i32::from(email_verified)),
            users::updated_at.eq(now_sql()),
        ))
        .execute(conn)?;

    require_row(rows_affected, user_id)
}

/// Replaces the role of a user.
///
/// # Errors
///
/// Returns an error if the update fails or the user does not exist.
pub fn set_role(
    conn: &mut SqliteConnection,
    user_id: &str,
    role: Role,
) -> Result<(), PersistenceError> {
    info!(user_id, role = %role, "Changing user role");

    let rows_affected: usize = diesel::update(users::table)
        .filter(users::user_id.eq(user_id))
        .set((users::role.eq(role.as_str()), users::updated_at.eq(now_sql())))
        .execute(conn)?;

    require_row(rows_affected, user_id)
}

/// Stores a password reset token and its expiry.
///
/// # Errors
///
/// Returns an error if the update fails or the user does not exist.
pub fn set_password_reset(
    conn: &mut SqliteConnection,
    user_id: &str,
    token: &str,
    expires_at: &str,
) -> Result<(), PersistenceError> {
    info!(user_id, expires_at, "Storing password reset token");

    let rows_affected: usize = diesel::update(users::table)
        .filter(users::user_id.eq(user_id))
        .set((
            users::password_reset_token.eq(Some(token)),
            users::password_reset_expires_at.eq(Some(expires_at)),
            users::updated_at.eq(now_sql()),
        ))
        .execute(conn)?;

    require_row(rows_affected, user_id)
}

/// Assigns a user to a program.
///
/// # Errors
///
/// Returns an error if the update fails or the user does not exist.
pub fn set_program(
    conn: &mut SqliteConnection,
    user_id: &str,
    program_id: Option<i64>,
) -> Result<(), PersistenceError> {
    debug!(user_id, ?program_id, "Setting user program");

    let rows_affected: usize = diesel::update(users::table)
        .filter(users::user_id.eq(user_id))
        .set((users::program_id.eq(program_id), users::updated_at.eq(now_sql())))
        .execute(conn)?;

    require_row(rows_affected, user_id)
}

/// Deletes a user row.
///
/// Sessions and notifications must already be gone; the database refuses
/// the delete while anything still references the user.
///
/// # Errors
///
/// Returns an error if the delete fails or the user does not exist.
pub fn delete_user(conn: &mut SqliteConnection, user_id: &str) -> Result<(), PersistenceError> {
    info!(user_id, "Deleting user");

    let rows_affected: usize = diesel::delete(users::table)
        .filter(users::user_id.eq(user_id))
        .execute(conn)?;

    require_row(rows_affected, user_id)?;

    info!(user_id, "User deleted");
    Ok(())
}
