// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use std::collections::HashSet;

use crate::error::DomainError;
use crate::types::{Dependents, Role, UserId};

/// Default upper bound on the number of users in one bulk request.
pub const DEFAULT_MAX_BATCH_SIZE: usize = 100;

/// Normalizes the raw target list of a bulk request.
///
/// Blank entries are dropped, duplicates are collapsed (first occurrence
/// wins) and the acting user's own identifier is removed.
///
/// # Arguments
///
/// * `raw_ids` - The identifiers as submitted
/// * `actor_id` - The identifier of the acting admin
///
/// # Errors
///
/// Returns an error if:
/// - No identifiers were submitted
/// - Removing the actor leaves nothing to process
pub fn normalize_targets(raw_ids: &[String], actor_id: &UserId) -> Result<Vec<UserId>, DomainError> {
    let submitted: Vec<UserId> = raw_ids
        .iter()
        .filter_map(|raw| UserId::new(raw).ok())
        .collect();

    if submitted.is_empty() {
        return Err(DomainError::EmptyTargetList);
    }

    let mut seen: HashSet<UserId> = HashSet::new();
    let targets: Vec<UserId> = submitted
        .into_iter()
        .filter(|id| id != actor_id)
        .filter(|id| seen.insert(id.clone()))
        .collect();

    if targets.is_empty() {
        return Err(DomainError::SelfModificationOnly);
    }

    Ok(targets)
}

/// Validates that a batch does not exceed the configured bound.
///
/// # Errors
///
/// Returns an error if `size` is greater than `max`.
pub const fn validate_batch_size(size: usize, max: usize) -> Result<(), DomainError> {
    if size > max {
        return Err(DomainError::BatchTooLarge { size, max });
    }
    Ok(())
}

/// Validates that nothing references a user about to be deleted.
///
/// Applications always block deletion. Program assignments block deletion
/// only for program admins.
///
/// # Errors
///
/// Returns the first blocker found.
pub const fn validate_deletable(role: Role, dependents: &Dependents) -> Result<(), DomainError> {
    if dependents.applications > 0 {
        return Err(DomainError::UserHasApplications {
            count: dependents.applications,
        });
    }
    if matches!(role, Role::ProgramAdmin) && dependents.assigned_programs > 0 {
        return Err(DomainError::ProgramAdminHasPrograms {
            count: dependents.assigned_programs,
        });
    }
    Ok(())
}
