// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use diesel::SqliteConnection;
use diesel::prelude::*;
use tracing::info;

use crate::backend::PersistenceBackend;
use crate::diesel_schema::{applications, programs};
use crate::error::PersistenceError;

/// Creates a program, optionally administered by a user.
///
/// # Errors
///
/// Returns an error if the insert fails (duplicate name, unknown admin).
pub fn create_program(
    conn: &mut SqliteConnection,
    program_name: &str,
    admin_user_id: Option<&str>,
) -> Result<i64, PersistenceError> {
    diesel::insert_into(programs::table)
        .values((
            programs::program_name.eq(program_name),
            programs::admin_user_id.eq(admin_user_id),
        ))
        .execute(conn)?;

    let program_id: i64 = conn.get_last_insert_rowid()?;

    info!(program_id, program_name, ?admin_user_id, "Program created");
    Ok(program_id)
}

/// Records an application from a user to a program.
///
/// # Errors
///
/// Returns an error if the insert fails (unknown user or program).
pub fn create_application(
    conn: &mut SqliteConnection,
    user_id: &str,
    program_id: i64,
) -> Result<i64, PersistenceError> {
    diesel::insert_into(applications::table)
        .values((
            applications::user_id.eq(user_id),
            applications::program_id.eq(program_id),
        ))
        .execute(conn)?;

    let application_id: i64 = conn.get_last_insert_rowid()?;

    info!(application_id, user_id, program_id, "Application created");
    Ok(application_id)
}
