//! # User Directory Routes
//!
//! Administrator-managed identity directory. Submission records carry the
//! submitter's display name resolved from here. A caller may look up
//! their own profile without the `ManageUsers` capability.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use zkgate_core::error::validated_text;
use zkgate_core::{Capability, Role, UserId};

use crate::auth::{require_capability, CallerIdentity};
use crate::error::AppError;
use crate::extractors::{extract_validated_json, Validate};
use crate::state::{AppState, UserRecord};

/// Request to create a directory identity.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateUserRequest {
    /// Display name.
    pub name: String,
    /// The identity's role.
    pub role: Role,
}

impl Validate for CreateUserRequest {
    fn validate(&self) -> Result<(), String> {
        validated_text("name", &self.name, 128)
            .map(drop)
            .map_err(|err| err.to_string())
    }
}

/// Build the user directory router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/biometric/users", get(list_users).post(create_user))
        .route("/biometric/users/:id", get(get_user).delete(remove_user))
}

/// POST /biometric/users — Create an identity.
#[utoipa::path(
    post,
    path = "/biometric/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "Identity created", body = UserRecord),
    ),
    tag = "users"
)]
pub async fn create_user(
    State(state): State<AppState>,
    caller: CallerIdentity,
    body: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<UserRecord>), AppError> {
    require_capability(&caller, Capability::ManageUsers)?;
    let req = extract_validated_json(body)?;

    let record = UserRecord {
        id: UserId::new(),
        name: validated_text("name", &req.name, 128)?,
        role: req.role,
        created_at: Utc::now(),
    };
    state.users.insert(*record.id.as_uuid(), record.clone());
    tracing::info!(user = %record.id, role = record.role.as_str(), "identity created");
    Ok((StatusCode::CREATED, Json(record)))
}

/// GET /biometric/users — List all identities.
#[utoipa::path(
    get,
    path = "/biometric/users",
    responses(
        (status = 200, description = "All identities", body = [UserRecord]),
    ),
    tag = "users"
)]
pub async fn list_users(
    State(state): State<AppState>,
    caller: CallerIdentity,
) -> Result<Json<Vec<UserRecord>>, AppError> {
    require_capability(&caller, Capability::ManageUsers)?;
    Ok(Json(state.users.list()))
}

/// GET /biometric/users/:id — Profile lookup.
///
/// Administrators may look up anyone; other callers only themselves.
#[utoipa::path(
    get,
    path = "/biometric/users/{id}",
    params(("id" = Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "The identity", body = UserRecord),
        (status = 404, description = "No such identity"),
    ),
    tag = "users"
)]
pub async fn get_user(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
) -> Result<Json<UserRecord>, AppError> {
    let is_self = caller.user_id.map(|u| *u.as_uuid() == id).unwrap_or(false);
    if !is_self {
        require_capability(&caller, Capability::ManageUsers)?;
    }
    state
        .users
        .get(&id)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("user {id}")))
}

/// DELETE /biometric/users/:id — Remove an identity.
#[utoipa::path(
    delete,
    path = "/biometric/users/{id}",
    params(("id" = Uuid, Path, description = "User id")),
    responses(
        (status = 204, description = "Identity removed"),
        (status = 404, description = "No such identity"),
    ),
    tag = "users"
)]
pub async fn remove_user(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    require_capability(&caller, Capability::ManageUsers)?;
    state
        .users
        .remove(&id)
        .ok_or_else(|| AppError::NotFound(format!("user {id}")))?;
    tracing::info!(user = %id, "identity removed");
    Ok(StatusCode::NO_CONTENT)
}
