// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! State-changing operations for the persistence layer.
//!
//! ## Module Organization
//!
//! - `audit` — Audit event persistence
//! - `users` — Account creation and field updates
//! - `programs` — Programs and applications
//! - `sessions` — Session lifecycle
//! - `notifications` — Notification inbox writes
//! - `transition` — Applying a bulk action transition for one user

pub mod audit;
pub mod notifications;
pub mod programs;
pub mod sessions;
pub mod transition;
pub mod users;

pub use transition::{PersistTransitionResult, persist_user_transition};

/// The current UTC time as RFC 3339, evaluated by `SQLite`.
///
/// Matches the column defaults in the migrations.
pub fn now_sql() -> diesel::expression::SqlLiteral<diesel::sql_types::Text> {
    diesel::dsl::sql::<diesel::sql_types::Text>("strftime('%Y-%m-%dT%H:%M:%SZ', 'now')")
}
