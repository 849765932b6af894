// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use admissions::CoreError;
use admissions_domain::DomainError;

use crate::{ApiError, AuthError, translate_core_error, translate_domain_error};

#[test]
fn test_request_validation_maps_to_invalid_input() {
    for (err, expected_field) in [
        (DomainError::InvalidAction(String::from("x")), "action"),
        (DomainError::MissingNewRole, "new_role"),
        (DomainError::InvalidRole(String::from("root")), "new_role"),
        (DomainError::EmptyTargetList, "user_ids"),
        (DomainError::BatchTooLarge { size: 101, max: 100 }, "user_ids"),
    ] {
        match translate_domain_error(err) {
            ApiError::InvalidInput { field, .. } => assert_eq!(field, expected_field),
            other => panic!("unexpected translation: {other:?}"),
        }
    }
}

#[test]
fn test_blockers_map_to_rule_violations() {
    let translated: ApiError =
        translate_domain_error(DomainError::UserHasApplications { count: 2 });

    assert_eq!(
        translated,
        ApiError::DomainRuleViolation {
            rule: String::from("user_has_applications"),
            message: String::from("Cannot delete user with 2 existing application(s)"),
        }
    );
    assert!(matches!(
        translate_domain_error(DomainError::SelfModificationOnly),
        ApiError::DomainRuleViolation { .. }
    ));
}

#[test]
fn test_core_errors_translate() {
    assert!(matches!(
        translate_core_error(CoreError::Internal(String::from("boom"))),
        ApiError::Internal { .. }
    ));
    assert!(matches!(
        translate_core_error(CoreError::DomainViolation(DomainError::UserNotFound(
            String::from("ghost")
        ))),
        ApiError::ResourceNotFound { .. }
    ));
}

#[test]
fn test_user_not_found_keeps_plain_message() {
    let api: ApiError = translate_domain_error(DomainError::UserNotFound(String::from("ghost")));

    assert_eq!(
        api,
        ApiError::ResourceNotFound {
            resource_type: String::from("User"),
            message: String::from("User not found"),
        }
    );
}

#[test]
fn test_auth_errors_convert() {
    let api: ApiError = AuthError::Unauthorized {
        action: String::from("list_users"),
        required_role: String::from("Administrator"),
    }
    .into();

    assert_eq!(
        api.to_string(),
        "Unauthorized: 'list_users' requires Administrator role"
    );
}
