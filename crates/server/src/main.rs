// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(clippy::multiple_crate_versions)]

mod live;
mod session;

#[cfg(test)]
mod tests;

use admissions_api::{
    ApiError, AuthenticationService, BulkActionConfig, BulkUserActionRequest,
    BulkUserActionResponse, ListAuditEventsResponse, ListNotificationsResponse, ListUsersResponse,
    LoginRequest, LoginResponse, MarkNotificationReadResponse, WhoAmIResponse, bootstrap_admin,
    bulk_user_action, list_audit_events, list_notifications, list_users, login, logout,
    mark_notification_read, whoami,
};
use admissions_audit::{Cause, USER_ENTITY};
use admissions_domain::DEFAULT_MAX_BATCH_SIZE;
use admissions_persistence::Persistence;
use axum::{
    Json, Router,
    extract::{FromRef, Path, Query, State as AxumState},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::live::{LiveEventBroadcaster, live_events_handler};
use crate::session::SessionUser;

/// Admissions Server - account administration API for the Admissions Portal
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the `SQLite` database file. If not provided, uses in-memory database.
    #[arg(short, long)]
    database: Option<String>,

    /// Address to bind the server to
    #[arg(short, long, default_value = "127.0.0.1")]
    bind: String,

    /// Port to bind the server to
    #[arg(short, long, default_value_t = 3000)]
    port: u16,

    /// Largest number of users a single bulk request may select
    #[arg(long, default_value_t = DEFAULT_MAX_BATCH_SIZE)]
    max_batch_size: usize,

    /// Email of the administrator seeded when no accounts exist
    #[arg(long, requires = "admin_password")]
    admin_email: Option<String>,

    /// Password of the administrator seeded when no accounts exist
    #[arg(long, requires = "admin_email")]
    admin_password: Option<String>,
}

/// Application state shared across handlers.
#[derive(Clone)]
struct AppState {
    /// The persistence layer. Holding the lock serialises bulk batches.
    persistence: Arc<Mutex<Persistence>>,
    /// Live notification broadcaster.
    live_events: Arc<LiveEventBroadcaster>,
    /// Limits applied to bulk requests.
    bulk_config: BulkActionConfig,
}

impl FromRef<AppState> for Arc<LiveEventBroadcaster> {
    fn from_ref(state: &AppState) -> Self {
        Arc::clone(&state.live_events)
    }
}

/// Query parameters for the audit trail endpoint.
#[derive(Debug, Deserialize)]
struct AuditQuery {
    /// The kind of entity. Defaults to user accounts.
    entity_type: Option<String>,
    /// The entity identifier.
    entity_id: String,
}

/// Error response type.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ErrorResponse {
    /// Error indicator.
    error: bool,
    /// Error message.
    message: String,
}

/// Response for logout.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct LogoutResponse {
    /// A success message.
    message: String,
}

/// HTTP error wrapper that implements `IntoResponse`.
struct HttpError {
    status: StatusCode,
    message: String,
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let body: Json<ErrorResponse> = Json(ErrorResponse {
            error: true,
            message: self.message,
        });
        (self.status, body).into_response()
    }
}

impl From<ApiError> for HttpError {
    fn from(err: ApiError) -> Self {
        let status: StatusCode = match err {
            ApiError::AuthenticationFailed { .. } => StatusCode::UNAUTHORIZED,
            ApiError::Unauthorized { .. } => StatusCode::FORBIDDEN,
            ApiError::DomainRuleViolation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::InvalidInput { .. } => StatusCode::BAD_REQUEST,
            ApiError::ResourceNotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Internal { .. } => {
                error!(error = %err, "Internal error");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

/// Creates the cause recorded for a request's audit events.
fn request_cause(description: &str) -> Cause {
    Cause::new(uuid::Uuid::new_v4().to_string(), description.to_string())
}

/// Handler for POST `/auth/login`.
async fn handle_login(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let response: LoginResponse = login(&mut persistence, &req)?;
    Ok(Json(response))
}

/// Handler for POST `/auth/logout`.
async fn handle_logout(
    AxumState(app_state): AxumState<AppState>,
    SessionUser(actor, _, token): SessionUser,
) -> Result<Json<LogoutResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    logout(&mut persistence, &token)?;
    info!(user_id = %actor.user_id, "User logged out");
    Ok(Json(LogoutResponse {
        message: String::from("Logged out"),
    }))
}

/// Handler for GET `/auth/whoami`.
async fn handle_whoami(SessionUser(actor, user, _): SessionUser) -> Json<WhoAmIResponse> {
    Json(whoami(&actor, &user))
}

/// Handler for POST `/admin/users/bulk`.
///
/// Runs the batch, then forwards the notifications it wrote to the live
/// stream once the persistence lock is released.
async fn handle_bulk_user_action(
    AxumState(app_state): AxumState<AppState>,
    SessionUser(actor, user, _): SessionUser,
    Json(req): Json<BulkUserActionRequest>,
) -> Result<Json<BulkUserActionResponse>, HttpError> {
    info!(
        actor_id = %actor.user_id,
        action = %req.action,
        selected = req.user_ids.len(),
        "Handling bulk user action request"
    );

    let cause: Cause = request_cause("Bulk user action request");

    let mut persistence = app_state.persistence.lock().await;
    let mut response: BulkUserActionResponse = bulk_user_action(
        &mut persistence,
        &req,
        &actor,
        &user,
        cause,
        app_state.bulk_config,
    )?;
    drop(persistence);

    app_state
        .live_events
        .broadcast_notifications(std::mem::take(&mut response.notifications));

    Ok(Json(response))
}

/// Handler for GET `/admin/users`.
async fn handle_list_users(
    AxumState(app_state): AxumState<AppState>,
    SessionUser(actor, _, _): SessionUser,
) -> Result<Json<ListUsersResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(list_users(&mut persistence, &actor)?))
}

/// Handler for GET `/admin/audit`.
async fn handle_list_audit_events(
    AxumState(app_state): AxumState<AppState>,
    SessionUser(actor, _, _): SessionUser,
    Query(query): Query<AuditQuery>,
) -> Result<Json<ListAuditEventsResponse>, HttpError> {
    let entity_type: &str = query.entity_type.as_deref().unwrap_or(USER_ENTITY);
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(list_audit_events(
        &mut persistence,
        &actor,
        entity_type,
        &query.entity_id,
    )?))
}

/// Handler for GET `/notifications`.
async fn handle_list_notifications(
    AxumState(app_state): AxumState<AppState>,
    SessionUser(actor, _, _): SessionUser,
) -> Result<Json<ListNotificationsResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(list_notifications(&mut persistence, &actor)?))
}

/// Handler for POST `/notifications/{notification_id}/read`.
async fn handle_mark_notification_read(
    AxumState(app_state): AxumState<AppState>,
    SessionUser(actor, _, _): SessionUser,
    Path(notification_id): Path<i64>,
) -> Result<Json<MarkNotificationReadResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(mark_notification_read(
        &mut persistence,
        &actor,
        notification_id,
    )?))
}

fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/auth/login", post(handle_login))
        .route("/auth/logout", post(handle_logout))
        .route("/auth/whoami", get(handle_whoami))
        .route("/admin/users", get(handle_list_users))
        .route("/admin/users/bulk", post(handle_bulk_user_action))
        .route("/admin/audit", get(handle_list_audit_events))
        .route("/notifications", get(handle_list_notifications))
        .route(
            "/notifications/{notification_id}/read",
            post(handle_mark_notification_read),
        )
        .route("/live", get(live_events_handler))
        .with_state(app_state)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Initializing Admissions Server");

    let mut persistence: Persistence = if let Some(db_path) = &args.database {
        info!("Using file-based database at: {}", db_path);
        Persistence::new_with_file(db_path)?
    } else {
        info!("Using in-memory database");
        Persistence::new_in_memory()?
    };

    if let (Some(email), Some(password)) = (&args.admin_email, &args.admin_password) {
        match bootstrap_admin(&mut persistence, email, password)? {
            Some(user_id) => info!(user_id = %user_id, email = %email, "Seeded administrator"),
            None => info!("Accounts already exist, skipping administrator seed"),
        }
    } else if persistence.count_users()? == 0 {
        warn!("No accounts exist; pass --admin-email and --admin-password to seed one");
    }

    let purged: usize = AuthenticationService::purge_expired_sessions(&mut persistence)?;
    info!(purged, "Removed expired sessions");

    let app_state: AppState = AppState {
        persistence: Arc::new(Mutex::new(persistence)),
        live_events: Arc::new(LiveEventBroadcaster::new()),
        bulk_config: BulkActionConfig {
            max_batch_size: args.max_batch_size,
        },
    };

    let app: Router = build_router(app_state);

    let addr: std::net::SocketAddr = format!("{}:{}", args.bind, args.port).parse()?;
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
