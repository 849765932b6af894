// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::{
    Dependents, DomainError, Role, UserId, normalize_targets, validate_batch_size,
    validate_deletable,
};

fn ids(raw: &[&str]) -> Vec<String> {
    raw.iter().map(|s| (*s).to_string()).collect()
}

#[test]
fn test_normalize_targets_removes_actor() {
    let actor: UserId = UserId::new("admin").unwrap();
    let targets = normalize_targets(&ids(&["a", "b", "admin"]), &actor).unwrap();

    assert_eq!(targets, vec![UserId::new("a").unwrap(), UserId::new("b").unwrap()]);
}

#[test]
fn test_normalize_targets_preserves_order_and_dedups() {
    let actor: UserId = UserId::new("admin").unwrap();
    let targets = normalize_targets(&ids(&["c", "a", "c", " a ", "b"]), &actor).unwrap();

    let values: Vec<&str> = targets.iter().map(UserId::as_str).collect();
    assert_eq!(values, vec!["c", "a", "b"]);
}

#[test]
fn test_normalize_targets_rejects_empty_list() {
    let actor: UserId = UserId::new("admin").unwrap();
    assert_eq!(
        normalize_targets(&[], &actor),
        Err(DomainError::EmptyTargetList)
    );
    assert_eq!(
        normalize_targets(&ids(&["", "  "]), &actor),
        Err(DomainError::EmptyTargetList)
    );
}

#[test]
fn test_normalize_targets_rejects_self_only() {
    let actor: UserId = UserId::new("admin").unwrap();
    assert_eq!(
        normalize_targets(&ids(&["admin", "admin"]), &actor),
        Err(DomainError::SelfModificationOnly)
    );
}

#[test]
fn test_batch_size_bound() {
    assert!(validate_batch_size(100, 100).is_ok());
    assert_eq!(
        validate_batch_size(101, 100),
        Err(DomainError::BatchTooLarge { size: 101, max: 100 })
    );
}

#[test]
fn test_applications_block_any_role() {
    for role in Role::ALL {
        assert_eq!(
            validate_deletable(role, &Dependents::new(2, 0)),
            Err(DomainError::UserHasApplications { count: 2 })
        );
    }
}

#[test]
fn test_programs_block_only_program_admins() {
    let dependents: Dependents = Dependents::new(0, 1);

    assert_eq!(
        validate_deletable(Role::ProgramAdmin, &dependents),
        Err(DomainError::ProgramAdminHasPrograms { count: 1 })
    );
    assert!(validate_deletable(Role::Student, &dependents).is_ok());
    assert!(validate_deletable(Role::Admin, &dependents).is_ok());
}

#[test]
fn test_no_dependents_is_deletable() {
    assert!(validate_deletable(Role::ProgramAdmin, &Dependents::default()).is_ok());
}
