// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Test helper functions and fixtures.

use admissions_audit::Cause;
use admissions_domain::{Role, UserId};
use admissions_persistence::{NewUser, Persistence, UserData};

use crate::{
    ApiError, AuthenticatedActor, BulkActionConfig, BulkUserActionRequest, BulkUserActionResponse,
    bulk_user_action,
};

pub const TEST_PASSWORD: &str = "password123";
pub const ADMIN_ID: &str = "admin-1";

pub fn create_test_persistence() -> Persistence {
    Persistence::new_in_memory().unwrap().with_password_hash_cost(4)
}

pub fn create_test_cause() -> Cause {
    Cause::new(String::from("api-req-456"), String::from("API request"))
}

pub fn seed_user(persistence: &mut Persistence, user_id: &str, role: Role) -> UserData {
    seed_user_with(persistence, user_id, role, true, false)
}

pub fn seed_user_with(
    persistence: &mut Persistence,
    user_id: &str,
    role: Role,
    is_active: bool,
    email_verified: bool,
) -> UserData {
    let email: String = format!("{user_id}@example.edu");
    persistence
        .create_user(&NewUser {
            user_id,
            email: &email,
            display_name: user_id,
            password: TEST_PASSWORD,
            role,
            is_active,
            email_verified,
        })
        .unwrap();
    persistence.get_user_by_id(user_id).unwrap().unwrap()
}

pub fn seed_admin(persistence: &mut Persistence) -> (AuthenticatedActor, UserData) {
    let user: UserData = seed_user(persistence, ADMIN_ID, Role::Admin);
    (
        AuthenticatedActor::new(UserId::new(ADMIN_ID).unwrap(), Role::Admin),
        user,
    )
}

pub fn actor_for(user: &UserData, role: Role) -> AuthenticatedActor {
    AuthenticatedActor::new(UserId::new(&user.user_id).unwrap(), role)
}

pub fn bulk_request(action: &str, user_ids: &[&str], send_notification: bool) -> BulkUserActionRequest {
    BulkUserActionRequest {
        action: action.to_string(),
        user_ids: user_ids.iter().map(ToString::to_string).collect(),
        send_notification,
        new_role: None,
    }
}

pub fn run_bulk(
    persistence: &mut Persistence,
    admin: &(AuthenticatedActor, UserData),
    request: &BulkUserActionRequest,
) -> Result<BulkUserActionResponse, ApiError> {
    bulk_user_action(
        persistence,
        request,
        &admin.0,
        &admin.1,
        create_test_cause(),
        BulkActionConfig::default(),
    )
}
