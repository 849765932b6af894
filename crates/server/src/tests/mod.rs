// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![allow(clippy::expect_used, clippy::unwrap_used)]


use admissions_api::BulkActionConfig;
use admissions_domain::Role;
use admissions_persistence::{NewUser, Persistence};
use axum::{
    Router,
    body::Body,
    http::{Request, Response},
};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower::ServiceExt;

use crate::live::LiveEventBroadcaster;
use crate::{AppState, build_router};

pub const TEST_PASSWORD: &str = "password123";

/// Creates app state over a fresh in-memory store.
pub fn create_test_app_state() -> AppState {
    let persistence: Persistence = Persistence::new_in_memory()
        .expect("Failed to create in-memory persistence")
        .with_password_hash_cost(4);
    AppState {
        persistence: Arc::new(Mutex::new(persistence)),
        live_events: Arc::new(LiveEventBroadcaster::new()),
        bulk_config: BulkActionConfig::default(),
    }
}

pub async fn seed_user(app_state: &AppState, user_id: &str, role: Role, is_active: bool) {
    let email: String = format!("{user_id}@example.edu");
    app_state
        .persistence
        .lock()
        .await
        .create_user(&NewUser {
            user_id,
            email: &email,
            display_name: user_id,
            password: TEST_PASSWORD,
            role,
            is_active,
            email_verified: false,
        })
        .unwrap();
}

pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.unwrap()
}

pub async fn read_json<T: DeserializeOwned>(response: Response<Body>) -> T {
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body_bytes).unwrap()
}

pub fn json_request(method: &str, uri: &str, token: Option<&str>, body: &serde_json::Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn empty_request(method: &str, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

/// Logs in through the router and returns the session token.
pub async fn login_as(app: &Router, user_id: &str) -> String {
    let response = send(
        app,
        json_request(
            "POST",
            "/auth/login",
            None,
            &serde_json::json!({
                "email": format!("{user_id}@example.edu"),
                "password": TEST_PASSWORD,
            }),
        ),
    )
    .await;
    let body: serde_json::Value = read_json(response).await;
    body["session_token"].as_str().unwrap().to_string()
}
