// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use admissions_domain::{NotificationKind, Role};
use admissions_persistence::Persistence;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::tests::helpers::{
    ADMIN_ID, actor_for, bulk_request, create_test_cause, create_test_persistence, run_bulk,
    seed_admin, seed_user, seed_user_with,
};
use crate::{ApiError, BulkActionConfig, BulkUserActionRequest, ProcessStatus, bulk_user_action};

fn add_session(persistence: &mut Persistence, token: &str, user_id: &str) {
    persistence
        .create_session(token, user_id, "2099-01-01T00:00:00.000000000Z")
        .unwrap();
}

#[test]
fn test_actor_is_removed_from_targets() {
    let mut persistence = create_test_persistence();
    let admin = seed_admin(&mut persistence);
    seed_user(&mut persistence, "student-a", Role::Student);
    seed_user(&mut persistence, "student-b", Role::Student);

    let response = run_bulk(
        &mut persistence,
        &admin,
        &bulk_request("deactivate", &["student-a", "student-b", ADMIN_ID], false),
    )
    .unwrap();

    assert_eq!(response.statistics.total_selected, 2);
    assert_eq!(response.statistics.success_count, 2);
    let ids: Vec<&str> = response
        .statistics
        .processed_users
        .iter()
        .map(|entry| entry.id.as_str())
        .collect();
    assert_eq!(ids, vec!["student-a", "student-b"]);
    assert!(persistence.get_user_by_id(ADMIN_ID).unwrap().unwrap().is_active);
}

#[test]
fn test_only_actor_selected_is_rejected() {
    let mut persistence = create_test_persistence();
    let admin = seed_admin(&mut persistence);

    let result = run_bulk(
        &mut persistence,
        &admin,
        &bulk_request("deactivate", &[ADMIN_ID], false),
    );

    assert!(matches!(result, Err(ApiError::DomainRuleViolation { .. })));
    assert_eq!(persistence.count_audit_events().unwrap(), 0);
}

#[test]
fn test_empty_selection_is_rejected() {
    let mut persistence = create_test_persistence();
    let admin = seed_admin(&mut persistence);

    let result = run_bulk(&mut persistence, &admin, &bulk_request("activate", &[], false));

    assert!(matches!(
        result,
        Err(ApiError::InvalidInput { ref field, .. }) if field == "user_ids"
    ));
}

#[test]
fn test_unknown_action_is_rejected() {
    let mut persistence = create_test_persistence();
    let admin = seed_admin(&mut persistence);
    seed_user(&mut persistence, "student-a", Role::Student);

    let result = run_bulk(
        &mut persistence,
        &admin,
        &bulk_request("archive", &["student-a"], false),
    );

    assert!(matches!(
        result,
        Err(ApiError::InvalidInput { ref field, .. }) if field == "action"
    ));
}

#[test]
fn test_non_admin_cannot_run_bulk_actions() {
    let mut persistence = create_test_persistence();
    let program_admin = seed_user(&mut persistence, "padmin-1", Role::ProgramAdmin);
    seed_user(&mut persistence, "student-a", Role::Student);

    let result = bulk_user_action(
        &mut persistence,
        &bulk_request("deactivate", &["student-a"], false),
        &actor_for(&program_admin, Role::ProgramAdmin),
        &program_admin,
        create_test_cause(),
        BulkActionConfig::default(),
    );

    assert!(matches!(result, Err(ApiError::Unauthorized { .. })));
    assert!(persistence.get_user_by_id("student-a").unwrap().unwrap().is_active);
}

#[test]
fn test_batch_larger_than_bound_is_rejected() {
    let mut persistence = create_test_persistence();
    let admin = seed_admin(&mut persistence);
    for id in ["student-a", "student-b", "student-c"] {
        seed_user(&mut persistence, id, Role::Student);
    }

    let result = bulk_user_action(
        &mut persistence,
        &bulk_request("deactivate", &["student-a", "student-b", "student-c"], false),
        &admin.0,
        &admin.1,
        create_test_cause(),
        BulkActionConfig { max_batch_size: 2 },
    );

    assert!(matches!(result, Err(ApiError::InvalidInput { .. })));
    assert_eq!(persistence.count_audit_events().unwrap(), 0);
}

#[test]
fn test_duplicate_ids_are_processed_once() {
    let mut persistence = create_test_persistence();
    let admin = seed_admin(&mut persistence);
    seed_user_with(&mut persistence, "student-a", Role::Student, false, false);

    let response = run_bulk(
        &mut persistence,
        &admin,
        &bulk_request("activate", &["student-a", "student-a"], false),
    )
    .unwrap();

    assert_eq!(response.statistics.total_selected, 1);
    assert_eq!(response.statistics.success_count, 1);
    assert_eq!(persistence.count_audit_events().unwrap(), 1);
}

#[test]
fn test_activate_twice_skips_both_times() {
    let mut persistence = create_test_persistence();
    let admin = seed_admin(&mut persistence);
    seed_user(&mut persistence, "student-a", Role::Student);

    for _ in 0..2 {
        let response = run_bulk(
            &mut persistence,
            &admin,
            &bulk_request("activate", &["student-a"], true),
        )
        .unwrap();

        assert!(response.success);
        assert_eq!(response.statistics.skipped_count, 1);
        assert_eq!(response.statistics.success_count, 0);
        assert_eq!(
            response.statistics.processed_users[0].status,
            ProcessStatus::Skipped
        );
        assert!(response.action_message.is_none());
        assert!(response.notifications.is_empty());
    }

    assert_eq!(persistence.count_audit_events().unwrap(), 0);
    assert_eq!(persistence.count_notifications_for_user("student-a").unwrap(), 0);
}

#[test]
fn test_activate_inactive_user_with_notification() {
    let mut persistence = create_test_persistence();
    let admin = seed_admin(&mut persistence);
    seed_user_with(&mut persistence, "student-a", Role::Student, false, false);

    let response = run_bulk(
        &mut persistence,
        &admin,
        &bulk_request("activate", &["student-a"], true),
    )
    .unwrap();

    assert_eq!(response.statistics.success_count, 1);
    assert_eq!(response.action_message.as_deref(), Some("1 user(s) activated"));
    assert!(response.errors.is_none());
    assert!(persistence.get_user_by_id("student-a").unwrap().unwrap().is_active);

    assert_eq!(response.notifications.len(), 1);
    assert_eq!(response.notifications[0].user_id, "student-a");
    assert_eq!(response.notifications[0].title, "Account Activated");
    assert_eq!(response.notifications[0].kind, NotificationKind::Success);
    assert_eq!(persistence.count_notifications_for_user("student-a").unwrap(), 1);
}

#[test]
fn test_notifications_are_not_sent_when_disabled() {
    let mut persistence = create_test_persistence();
    let admin = seed_admin(&mut persistence);
    seed_user_with(&mut persistence, "student-a", Role::Student, false, false);

    let response = run_bulk(
        &mut persistence,
        &admin,
        &bulk_request("activate", &["student-a"], false),
    )
    .unwrap();

    assert_eq!(response.statistics.success_count, 1);
    assert!(response.notifications.is_empty());
    assert_eq!(persistence.count_notifications_for_user("student-a").unwrap(), 0);
    assert_eq!(persistence.count_audit_events().unwrap(), 1);
}

#[test]
fn test_deactivate_ends_sessions() {
    let mut persistence = create_test_persistence();
    let admin = seed_admin(&mut persistence);
    seed_user(&mut persistence, "student-a", Role::Student);
    add_session(&mut persistence, "token-a1", "student-a");
    add_session(&mut persistence, "token-a2", "student-a");

    let response = run_bulk(
        &mut persistence,
        &admin,
        &bulk_request("deactivate", &["student-a"], true),
    )
    .unwrap();

    assert_eq!(response.statistics.success_count, 1);
    assert!(!persistence.get_user_by_id("student-a").unwrap().unwrap().is_active);
    assert_eq!(persistence.count_sessions_for_user("student-a").unwrap(), 0);
    assert_eq!(response.notifications[0].kind, NotificationKind::Warning);
}

#[test]
fn test_delete_blocked_by_application() {
    let mut persistence = create_test_persistence();
    let admin = seed_admin(&mut persistence);
    seed_user(&mut persistence, "student-a", Role::Student);
    let program_id: i64 = persistence.create_program("Nursing", None).unwrap();
    persistence.create_application("student-a", program_id).unwrap();

    let response = run_bulk(
        &mut persistence,
        &admin,
        &bulk_request("delete", &["student-a"], false),
    )
    .unwrap();

    assert_eq!(response.statistics.error_count, 1);
    let entry = &response.statistics.processed_users[0];
    assert_eq!(entry.status, ProcessStatus::Error);
    assert_eq!(entry.email.as_deref(), Some("student-a@example.edu"));
    assert_eq!(
        entry.reason.as_deref(),
        Some("Cannot delete user with 1 existing application(s)")
    );

    let errors: Vec<String> = response.errors.unwrap();
    assert_eq!(
        errors,
        vec![String::from(
            "student-a@example.edu: Cannot delete user with 1 existing application(s)"
        )]
    );

    assert!(persistence.get_user_by_id("student-a").unwrap().is_some());
    assert_eq!(persistence.count_audit_events().unwrap(), 0);
}

#[test]
fn test_delete_blocked_for_program_admin_with_programs() {
    let mut persistence = create_test_persistence();
    let admin = seed_admin(&mut persistence);
    seed_user(&mut persistence, "padmin-1", Role::ProgramAdmin);
    persistence
        .create_program("Engineering", Some("padmin-1"))
        .unwrap();

    let response = run_bulk(
        &mut persistence,
        &admin,
        &bulk_request("delete", &["padmin-1"], false),
    )
    .unwrap();

    assert_eq!(response.statistics.error_count, 1);
    assert!(
        response.statistics.processed_users[0]
            .reason
            .as_deref()
            .unwrap()
            .contains("program")
    );
    assert!(persistence.get_user_by_id("padmin-1").unwrap().is_some());
}

#[test]
fn test_delete_removes_user_and_dependents() {
    let mut persistence = create_test_persistence();
    let admin = seed_admin(&mut persistence);
    seed_user(&mut persistence, "student-a", Role::Student);
    add_session(&mut persistence, "token-a1", "student-a");
    persistence
        .insert_notification("student-a", "Welcome", "Hello", NotificationKind::Info)
        .unwrap();

    let response = run_bulk(
        &mut persistence,
        &admin,
        &bulk_request("delete", &["student-a"], true),
    )
    .unwrap();

    assert_eq!(response.statistics.success_count, 1);
    assert!(response.notifications.is_empty());
    assert!(persistence.get_user_by_id("student-a").unwrap().is_none());
    assert_eq!(persistence.count_sessions_for_user("student-a").unwrap(), 0);
    assert_eq!(persistence.count_notifications_for_user("student-a").unwrap(), 0);

    let trail = persistence
        .list_audit_events_for_entity("user", "student-a")
        .unwrap();
    assert_eq!(trail.len(), 1);
    assert_eq!(trail[0].action.name, "DeleteUser");
}

#[test]
fn test_storage_failure_rolls_back_only_that_user() {
    let mut persistence = create_test_persistence();
    let admin = seed_admin(&mut persistence);
    seed_user(&mut persistence, "student-a", Role::Student);
    seed_user(&mut persistence, "student-b", Role::Student);
    add_session(&mut persistence, "token-a1", "student-a");
    add_session(&mut persistence, "token-b1", "student-b");
    // Students are not blocked by program assignments, so the row delete
    // itself hits the foreign key.
    persistence
        .create_program("Physics", Some("student-a"))
        .unwrap();

    let response = run_bulk(
        &mut persistence,
        &admin,
        &bulk_request("delete", &["student-a", "student-b"], false),
    )
    .unwrap();

    assert!(response.success);
    assert_eq!(response.statistics.error_count, 1);
    assert_eq!(response.statistics.success_count, 1);
    assert_eq!(
        response.statistics.processed_users[0].status,
        ProcessStatus::Error
    );

    assert!(persistence.get_user_by_id("student-a").unwrap().is_some());
    assert_eq!(persistence.count_sessions_for_user("student-a").unwrap(), 1);
    assert!(
        persistence
            .list_audit_events_for_entity("user", "student-a")
            .unwrap()
            .is_empty()
    );

    assert!(persistence.get_user_by_id("student-b").unwrap().is_none());
    assert_eq!(persistence.count_sessions_for_user("student-b").unwrap(), 0);
}

#[test]
fn test_change_role_with_invalid_role_aborts_batch() {
    let mut persistence = create_test_persistence();
    let admin = seed_admin(&mut persistence);
    seed_user(&mut persistence, "student-a", Role::Student);

    let request = BulkUserActionRequest {
        new_role: Some(String::from("superuser")),
        ..bulk_request("change_role", &["student-a"], true)
    };
    let result = run_bulk(&mut persistence, &admin, &request);

    assert!(matches!(
        result,
        Err(ApiError::InvalidInput { ref field, .. }) if field == "new_role"
    ));
    assert_eq!(persistence.count_audit_events().unwrap(), 0);
    assert_eq!(
        persistence.get_user_by_id("student-a").unwrap().unwrap().role,
        "student"
    );
}

#[test]
fn test_change_role_without_role_aborts_batch() {
    let mut persistence = create_test_persistence();
    let admin = seed_admin(&mut persistence);
    seed_user(&mut persistence, "student-a", Role::Student);

    let result = run_bulk(
        &mut persistence,
        &admin,
        &bulk_request("change_role", &["student-a"], false),
    );

    assert!(matches!(result, Err(ApiError::InvalidInput { .. })));
    assert_eq!(persistence.count_audit_events().unwrap(), 0);
}

#[test]
fn test_change_role_applies_and_skips() {
    let mut persistence = create_test_persistence();
    let admin = seed_admin(&mut persistence);
    seed_user(&mut persistence, "student-a", Role::Student);
    seed_user(&mut persistence, "padmin-1", Role::ProgramAdmin);

    let request = BulkUserActionRequest {
        new_role: Some(String::from("program_admin")),
        ..bulk_request("change_role", &["student-a", "padmin-1"], true)
    };
    let response = run_bulk(&mut persistence, &admin, &request).unwrap();

    assert_eq!(response.statistics.success_count, 1);
    assert_eq!(response.statistics.skipped_count, 1);
    assert_eq!(
        persistence.get_user_by_id("student-a").unwrap().unwrap().role,
        "program_admin"
    );

    let trail = persistence
        .list_audit_events_for_entity("user", "student-a")
        .unwrap();
    assert_eq!(trail.len(), 1);
    assert_eq!(trail[0].before.data, "role=student");
    assert_eq!(trail[0].after.data, "role=program_admin");
    assert_eq!(trail[0].actor.email.as_deref(), Some("admin-1@example.edu"));
    assert_eq!(trail[0].cause.id, "api-req-456");

    assert_eq!(response.notifications.len(), 1);
    assert_eq!(response.notifications[0].title, "Role Changed");
}

#[test]
fn test_password_reset_issues_token() {
    let mut persistence = create_test_persistence();
    let admin = seed_admin(&mut persistence);
    seed_user(&mut persistence, "student-a", Role::Student);

    let before: OffsetDateTime = OffsetDateTime::now_utc();
    let response = run_bulk(
        &mut persistence,
        &admin,
        &bulk_request("send_password_reset", &["student-a"], true),
    )
    .unwrap();

    assert_eq!(response.statistics.success_count, 1);

    let user = persistence.get_user_by_id("student-a").unwrap().unwrap();
    let token: String = user.password_reset_token.unwrap();
    assert_eq!(token.len(), 64);
    assert!(token.chars().all(|c| c.is_ascii_hexdigit()));

    let expires_at: OffsetDateTime = OffsetDateTime::parse(
        &user.password_reset_expires_at.unwrap(),
        &Rfc3339,
    )
    .unwrap();
    let expected: OffsetDateTime = before + time::Duration::hours(24);
    assert!((expires_at - expected).abs() < time::Duration::seconds(5));

    assert_eq!(persistence.count_notifications_for_user("student-a").unwrap(), 1);
    let trail = persistence
        .list_audit_events_for_entity("user", "student-a")
        .unwrap();
    assert_eq!(trail.len(), 1);
    assert!(!trail[0].after.data.contains(&token));
}

#[test]
fn test_verify_email_skips_verified_user() {
    let mut persistence = create_test_persistence();
    let admin = seed_admin(&mut persistence);
    seed_user_with(&mut persistence, "student-a", Role::Student, true, true);
    seed_user(&mut persistence, "student-b", Role::Student);

    let response = run_bulk(
        &mut persistence,
        &admin,
        &bulk_request("verify_email", &["student-a", "student-b"], false),
    )
    .unwrap();

    let skipped = &response.statistics.processed_users[0];
    assert_eq!(skipped.status, ProcessStatus::Skipped);
    assert!(skipped.reason.as_deref().unwrap().contains("already verified"));
    assert!(
        persistence
            .list_audit_events_for_entity("user", "student-a")
            .unwrap()
            .is_empty()
    );

    assert_eq!(response.statistics.success_count, 1);
    assert!(persistence.get_user_by_id("student-b").unwrap().unwrap().email_verified);
}

#[test]
fn test_missing_user_is_reported_and_batch_continues() {
    let mut persistence = create_test_persistence();
    let admin = seed_admin(&mut persistence);
    seed_user(&mut persistence, "student-a", Role::Student);

    let response = run_bulk(
        &mut persistence,
        &admin,
        &bulk_request("deactivate", &["ghost", "student-a"], false),
    )
    .unwrap();

    assert_eq!(response.statistics.total_selected, 2);
    assert_eq!(response.statistics.error_count, 1);
    assert_eq!(response.statistics.success_count, 1);

    let missing = &response.statistics.processed_users[0];
    assert_eq!(missing.id, "ghost");
    assert_eq!(missing.email, None);
    assert_eq!(missing.reason.as_deref(), Some("User not found"));
    assert_eq!(response.errors.unwrap(), vec![String::from("ghost: User not found")]);

    assert!(!persistence.get_user_by_id("student-a").unwrap().unwrap().is_active);
}

#[test]
fn test_response_serializes_without_notifications() {
    let mut persistence = create_test_persistence();
    let admin = seed_admin(&mut persistence);
    seed_user_with(&mut persistence, "student-a", Role::Student, false, false);

    let response = run_bulk(
        &mut persistence,
        &admin,
        &bulk_request("activate", &["student-a"], true),
    )
    .unwrap();
    let json: serde_json::Value = serde_json::to_value(&response).unwrap();

    assert_eq!(json["statistics"]["success_count"], 1);
    assert_eq!(json["statistics"]["processed_users"][0]["status"], "success");
    assert!(json.get("notifications").is_none());
    assert!(json.get("errors").is_none());
}

#[test]
fn test_batch_transaction_failure_is_internal_and_writes_nothing() {
    let mut persistence = create_test_persistence();
    let admin = seed_admin(&mut persistence);
    seed_user_with(&mut persistence, "student-a", Role::Student, false, false);
    seed_user_with(&mut persistence, "student-b", Role::Student, false, false);
    // An open transaction on the connection makes the batch BEGIN fail.
    persistence.execute_raw_sql("BEGIN").unwrap();

    let result = run_bulk(
        &mut persistence,
        &admin,
        &bulk_request("activate", &["student-a", "student-b"], true),
    );
    persistence.execute_raw_sql("ROLLBACK").unwrap();

    match result {
        Err(ApiError::Internal { message }) => {
            assert!(message.contains("rolled back"), "{message}");
        }
        other => panic!("expected an internal error, got {other:?}"),
    }
    assert_eq!(persistence.count_audit_events().unwrap(), 0);
    assert_eq!(persistence.count_notifications_for_user("student-a").unwrap(), 0);
    for id in ["student-a", "student-b"] {
        let user = persistence.get_user_by_id(id).unwrap().unwrap();
        assert!(!user.is_active);
    }
}
