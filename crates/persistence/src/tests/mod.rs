// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![allow(clippy::expect_used, clippy::unwrap_used)]

mod audit_tests;

use admissions_audit::{Actor, Cause};
use admissions_domain::Role;

use crate::{NewUser, Persistence};

/// Minimum bcrypt cost; keeps hashing fast in tests.
pub const TEST_HASH_COST: u32 = 4;

pub fn create_test_persistence() -> Persistence {
    Persistence::new_in_memory()
        .unwrap()
        .with_password_hash_cost(TEST_HASH_COST)
}

pub fn create_test_user(persistence: &mut Persistence, user_id: &str, role: Role) {
    let email: String = format!("{user_id}@example.edu");
    persistence
        .create_user(&NewUser {
            user_id,
            email: &email,
            display_name: user_id,
            password: "password123",
            role,
            is_active: true,
            email_verified: false,
        })
        .unwrap();
}

pub fn create_test_actor() -> Actor {
    Actor::with_user(
        String::from("admin-1"),
        String::from("admin"),
        String::from("admin-1@example.edu"),
    )
}

pub fn create_test_cause() -> Cause {
    Cause::new(String::from("test-cause"), String::from("Test operation"))
}
