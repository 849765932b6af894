// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Audit event queries.

use admissions_audit::{Action, Actor, AuditEvent, Cause, StateSnapshot, Subject};
use diesel::SqliteConnection;
use diesel::dsl::count;
use diesel::prelude::*;

use crate::data_models::{ActionData, ActorData, CauseData, StateSnapshotData};
use crate::diesel_schema::audit_events;
use crate::error::PersistenceError;

/// Diesel Queryable struct for full audit event rows.
#[derive(Queryable, Selectable)]
#[diesel(table_name = audit_events)]
struct AuditEventRow {
    event_id: i64,
    #[allow(dead_code)]
    actor_id: String,
    actor_json: String,
    cause_json: String,
    action_json: String,
    entity_type: String,
    entity_id: String,
    before_snapshot_json: String,
    after_snapshot_json: String,
    created_at: String,
}

/// Rebuilds an `AuditEvent` from its stored row.
fn reconstruct(row: AuditEventRow) -> Result<AuditEvent, PersistenceError> {
    let actor_data: ActorData = serde_json::from_str(&row.actor_json)?;
    let cause_data: CauseData = serde_json::from_str(&row.cause_json)?;
    let action_data: ActionData = serde_json::from_str(&row.action_json)?;
    let before_data: StateSnapshotData = serde_json::from_str(&row.before_snapshot_json)?;
    let after_data: StateSnapshotData = serde_json::from_str(&row.after_snapshot_json)?;

    let actor: Actor = match actor_data.email {
        Some(email) => Actor::with_user(actor_data.id, actor_data.actor_type, email),
        None => Actor::new(actor_data.id, actor_data.actor_type),
    };

    Ok(AuditEvent::new(
        actor,
        Cause::new(cause_data.id, cause_data.description),
        Action::new(action_data.name, action_data.details),
        Subject::new(row.entity_type, row.entity_id),
        StateSnapshot::new(before_data.data),
        StateSnapshot::new(after_data.data),
    )
    .persisted(row.event_id, row.created_at))
}

/// Retrieves an audit event by ID.
///
/// # Errors
///
/// Returns an error if the event is not found or cannot be deserialized.
pub fn get_audit_event(
    conn: &mut SqliteConnection,
    event_id: i64,
) -> Result<AuditEvent, PersistenceError> {
    let result = audit_events::table
        .filter(audit_events::event_id.eq(event_id))
        .select(AuditEventRow::as_select())
        .first::<AuditEventRow>(conn);

    match result {
        Ok(row) => reconstruct(row),
        Err(diesel::result::Error::NotFound) => Err(PersistenceError::EventNotFound(event_id)),
        Err(e) => Err(PersistenceError::from(e)),
    }
}

/// Retrieves every audit event about one entity, oldest first.
///
/// # Errors
///
/// Returns an error if events cannot be retrieved or deserialized.
pub fn list_audit_events_for_entity(
    conn: &mut SqliteConnection,
    entity_type: &str,
    entity_id: &str,
) -> Result<Vec<AuditEvent>, PersistenceError> {
    let rows: Vec<AuditEventRow> = audit_events::table
        .filter(audit_events::entity_type.eq(entity_type))
        .filter(audit_events::entity_id.eq(entity_id))
        .order(audit_events::event_id.asc())
        .select(AuditEventRow::as_select())
        .load(conn)?;

    rows.into_iter().map(reconstruct).collect()
}

/// Retrieves the most recent audit events, newest first.
///
/// # Errors
///
/// Returns an error if events cannot be retrieved or deserialized.
pub fn list_recent_audit_events(
    conn: &mut SqliteConnection,
    limit: i64,
) -> Result<Vec<AuditEvent>, PersistenceError> {
    let rows: Vec<AuditEventRow> = audit_events::table
        .order(audit_events::event_id.desc())
        .limit(limit)
        .select(AuditEventRow::as_select())
        .load(conn)?;

    rows.into_iter().map(reconstruct).collect()
}

/// Counts all audit events.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn count_audit_events(conn: &mut SqliteConnection) -> Result<i64, PersistenceError> {
    let total: i64 = audit_events::table
        .select(count(audit_events::event_id))
        .first(conn)?;
    Ok(total)
}
