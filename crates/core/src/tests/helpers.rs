// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::{ApplyContext, Outcome, UserState, UserTransition};
use admissions_audit::{Actor, Cause};
use admissions_domain::{Role, UserId};
use time::OffsetDateTime;
use time::macros::datetime;

pub const TEST_NOW: OffsetDateTime = datetime!(2026-03-01 12:00:00 UTC);

pub fn create_test_actor() -> Actor {
    Actor::with_user(
        String::from("admin-123"),
        String::from("admin"),
        String::from("admin@example.edu"),
    )
}

pub fn create_test_cause() -> Cause {
    Cause::new(String::from("req-456"), String::from("Bulk user action"))
}

pub fn create_test_context(send_notification: bool) -> ApplyContext {
    ApplyContext::new(
        create_test_actor(),
        create_test_cause(),
        send_notification,
        TEST_NOW,
    )
}

pub fn create_test_user(role: Role, is_active: bool, email_verified: bool) -> UserState {
    UserState {
        user_id: UserId::new("user-001").unwrap(),
        email: String::from("student@example.edu"),
        display_name: String::from("Test Student"),
        role,
        is_active,
        email_verified,
        password_reset_expires_at: None,
    }
}

pub fn expect_transition(outcome: Outcome) -> UserTransition {
    match outcome {
        Outcome::Apply(transition) => transition,
        Outcome::Skip { reason } => panic!("expected a transition, got skip: {reason}"),
    }
}

pub fn expect_skip(outcome: Outcome) -> String {
    match outcome {
        Outcome::Skip { reason } => reason,
        Outcome::Apply(transition) => panic!("expected a skip, got {transition:?}"),
    }
}
