// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::BulkAction;
use admissions_domain::{DomainError, Role};

#[test]
fn test_parse_simple_actions() {
    assert_eq!(BulkAction::parse("activate", None).unwrap(), BulkAction::Activate);
    assert_eq!(
        BulkAction::parse("deactivate", None).unwrap(),
        BulkAction::Deactivate
    );
    assert_eq!(BulkAction::parse("delete", None).unwrap(), BulkAction::Delete);
    assert_eq!(
        BulkAction::parse("send_password_reset", None).unwrap(),
        BulkAction::SendPasswordReset
    );
    assert_eq!(
        BulkAction::parse(" verify_email ", None).unwrap(),
        BulkAction::VerifyEmail
    );
}

#[test]
fn test_parse_ignores_role_for_other_actions() {
    assert_eq!(
        BulkAction::parse("activate", Some("not-a-role")).unwrap(),
        BulkAction::Activate
    );
}

#[test]
fn test_parse_change_role() {
    let action: BulkAction = BulkAction::parse("change_role", Some("program_admin")).unwrap();
    assert_eq!(
        action,
        BulkAction::ChangeRole {
            new_role: Role::ProgramAdmin
        }
    );
}

#[test]
fn test_parse_change_role_requires_role() {
    assert_eq!(
        BulkAction::parse("change_role", None),
        Err(DomainError::MissingNewRole)
    );
    assert_eq!(
        BulkAction::parse("change_role", Some("   ")),
        Err(DomainError::MissingNewRole)
    );
}

#[test]
fn test_parse_change_role_rejects_unknown_role() {
    let result: Result<BulkAction, DomainError> = BulkAction::parse("change_role", Some("superuser"));
    assert_eq!(result, Err(DomainError::InvalidRole(String::from("superuser"))));
}

#[test]
fn test_parse_rejects_empty_and_unknown_actions() {
    assert!(matches!(
        BulkAction::parse("", None),
        Err(DomainError::InvalidAction(_))
    ));
    assert!(matches!(
        BulkAction::parse("promote", None),
        Err(DomainError::InvalidAction(msg)) if msg.contains("promote")
    ));
}

#[test]
fn test_names_round_trip_through_parse() {
    let actions: [BulkAction; 6] = [
        BulkAction::Activate,
        BulkAction::Deactivate,
        BulkAction::Delete,
        BulkAction::SendPasswordReset,
        BulkAction::ChangeRole {
            new_role: Role::Student,
        },
        BulkAction::VerifyEmail,
    ];
    for action in actions {
        let parsed: BulkAction = BulkAction::parse(action.name(), Some("student")).unwrap();
        assert_eq!(parsed, action);
    }
}

#[test]
fn test_only_delete_requires_dependents() {
    assert!(BulkAction::Delete.requires_dependents());
    assert!(!BulkAction::Activate.requires_dependents());
    assert!(!BulkAction::VerifyEmail.requires_dependents());
}

#[test]
fn test_completion_message_mentions_count() {
    let message: String = BulkAction::ChangeRole {
        new_role: Role::Admin,
    }
    .completion_message(3);
    assert!(message.contains('3'));
    assert!(message.contains("Administrator"));
}
