// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Audit event serialization round trips through the database.

use admissions_audit::{Action, Actor, AuditEvent, Cause, StateSnapshot, Subject, USER_ENTITY};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::PersistenceError;
use crate::tests::{create_test_actor, create_test_cause, create_test_persistence};

fn create_test_event(entity_id: &str, action: &str) -> AuditEvent {
    AuditEvent::new(
        create_test_actor(),
        create_test_cause(),
        Action::new(action.to_string(), Some(String::from("details"))),
        Subject::new(USER_ENTITY.to_string(), entity_id.to_string()),
        StateSnapshot::new(String::from("is_active=false")),
        StateSnapshot::new(String::from("is_active=true")),
    )
}

#[test]
fn test_persist_and_get_audit_event() {
    let mut persistence = create_test_persistence();
    let event = create_test_event("user-1", "ActivateUser");

    let event_id = persistence.persist_audit_event(&event).unwrap();
    let stored = persistence.get_audit_event(event_id).unwrap();

    assert_eq!(stored.event_id, Some(event_id));
    assert!(OffsetDateTime::parse(stored.created_at.as_deref().unwrap(), &Rfc3339).is_ok());
    assert_eq!(stored.actor, event.actor);
    assert_eq!(stored.cause, event.cause);
    assert_eq!(stored.action, event.action);
    assert_eq!(stored.subject, event.subject);
    assert_eq!(stored.before, event.before);
    assert_eq!(stored.after, event.after);
}

#[test]
fn test_actor_without_email_round_trips() {
    let mut persistence = create_test_persistence();
    let mut event = create_test_event("user-1", "ActivateUser");
    event.actor = Actor::new(String::from("system"), String::from("system"));

    let event_id = persistence.persist_audit_event(&event).unwrap();
    let stored = persistence.get_audit_event(event_id).unwrap();
    assert!(stored.actor.email.is_none());
}

#[test]
fn test_missing_event_is_reported() {
    let mut persistence = create_test_persistence();
    assert_eq!(
        persistence.get_audit_event(42),
        Err(PersistenceError::EventNotFound(42))
    );
}

#[test]
fn test_list_events_for_entity() {
    let mut persistence = create_test_persistence();
    persistence
        .persist_audit_event(&create_test_event("user-1", "DeactivateUser"))
        .unwrap();
    persistence
        .persist_audit_event(&create_test_event("user-2", "DeactivateUser"))
        .unwrap();
    persistence
        .persist_audit_event(&create_test_event("user-1", "ActivateUser"))
        .unwrap();

    let events = persistence
        .list_audit_events_for_entity(USER_ENTITY, "user-1")
        .unwrap();
    let names: Vec<&str> = events.iter().map(|e| e.action.name.as_str()).collect();
    assert_eq!(names, vec!["DeactivateUser", "ActivateUser"]);

    let recent = persistence.list_recent_audit_events(1).unwrap();
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].subject.entity_id, "user-1");
    assert_eq!(persistence.count_audit_events().unwrap(), 3);
}

#[test]
fn test_events_need_no_user_row() {
    // Audit entries outlive the accounts they describe.
    let mut persistence = create_test_persistence();
    let event = AuditEvent::new(
        create_test_actor(),
        Cause::new(String::from("c"), String::from("d")),
        Action::new(String::from("DeleteUser"), None),
        Subject::new(USER_ENTITY.to_string(), String::from("long-gone")),
        StateSnapshot::new(String::from("email=x")),
        StateSnapshot::new(String::from("deleted")),
    );
    assert!(persistence.persist_audit_event(&event).is_ok());
}
