//! # Archive Review Routes
//!
//! The reviewer's view of the proof archive: listing, record inspection,
//! blob download, and adjudication.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, put};
use axum::{Json, Router};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use zkgate_archive::{ListFilter, ProofSubmission, SubmissionStatus};
use zkgate_core::{Capability, SubmissionId};

use crate::auth::{require_capability, CallerIdentity};
use crate::error::AppError;
use crate::extractors::extract_json;
use crate::state::AppState;

/// Listing filters.
#[derive(Debug, Deserialize, IntoParams)]
pub struct ListSubmissionsQuery {
    /// Keep only submissions with this status.
    pub status: Option<SubmissionStatus>,
    /// Free-text match against the submitter's display name.
    pub q: Option<String>,
}

/// Adjudication request. Notes replace any prior notes.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SetStatusRequest {
    /// The new status.
    pub status: SubmissionStatus,
    /// Reviewer notes, written together with the status.
    pub verification_notes: Option<String>,
}

/// Build the archive review router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/biometric/proof-submissions", get(list_submissions))
        .route("/biometric/proof-submissions/:id", get(get_submission))
        .route("/biometric/proof-submissions/:id/proof", get(download_proof))
        .route("/biometric/proof-submissions/:id/public", get(download_public))
        .route("/biometric/proof-submissions/:id/status", put(set_status))
}

/// GET /biometric/proof-submissions — List submissions, newest first,
/// blobs omitted.
#[utoipa::path(
    get,
    path = "/biometric/proof-submissions",
    params(ListSubmissionsQuery),
    responses(
        (status = 200, description = "Submission records", body = [ProofSubmission]),
    ),
    tag = "archive"
)]
pub async fn list_submissions(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Query(query): Query<ListSubmissionsQuery>,
) -> Result<Json<Vec<ProofSubmission>>, AppError> {
    require_capability(&caller, Capability::ReviewArchive)?;
    let filter = ListFilter {
        status: query.status,
        query: query.q,
    };
    Ok(Json(state.archive.list(&filter)))
}

/// GET /biometric/proof-submissions/:id — Fetch one record.
#[utoipa::path(
    get,
    path = "/biometric/proof-submissions/{id}",
    params(("id" = Uuid, Path, description = "Submission id")),
    responses(
        (status = 200, description = "The submission record", body = ProofSubmission),
        (status = 404, description = "No such submission"),
    ),
    tag = "archive"
)]
pub async fn get_submission(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
) -> Result<Json<ProofSubmission>, AppError> {
    require_capability(&caller, Capability::ReviewArchive)?;
    Ok(Json(state.archive.get(SubmissionId::from_uuid(id))?))
}

/// GET /biometric/proof-submissions/:id/proof — Download the proof blob.
#[utoipa::path(
    get,
    path = "/biometric/proof-submissions/{id}/proof",
    params(("id" = Uuid, Path, description = "Submission id")),
    responses(
        (status = 200, description = "Proof JSON attachment"),
        (status = 404, description = "No such submission"),
    ),
    tag = "archive"
)]
pub async fn download_proof(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    require_capability(&caller, Capability::ReviewArchive)?;
    let bytes = state.archive.proof_bytes(SubmissionId::from_uuid(id))?;
    Ok(attachment(&format!("proof-{id}.json"), bytes))
}

/// GET /biometric/proof-submissions/:id/public — Download the public-input
/// blob.
#[utoipa::path(
    get,
    path = "/biometric/proof-submissions/{id}/public",
    params(("id" = Uuid, Path, description = "Submission id")),
    responses(
        (status = 200, description = "Public-input JSON attachment"),
        (status = 404, description = "No such submission"),
    ),
    tag = "archive"
)]
pub async fn download_public(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    require_capability(&caller, Capability::ReviewArchive)?;
    let bytes = state.archive.public_bytes(SubmissionId::from_uuid(id))?;
    Ok(attachment(&format!("public-{id}.json"), bytes))
}

/// PUT /biometric/proof-submissions/:id/status — Adjudicate a submission.
#[utoipa::path(
    put,
    path = "/biometric/proof-submissions/{id}/status",
    params(("id" = Uuid, Path, description = "Submission id")),
    request_body = SetStatusRequest,
    responses(
        (status = 200, description = "Updated record", body = ProofSubmission),
        (status = 404, description = "No such submission"),
        (status = 409, description = "Not a legal workflow transition"),
    ),
    tag = "archive"
)]
pub async fn set_status(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
    body: Result<Json<SetStatusRequest>, JsonRejection>,
) -> Result<Json<ProofSubmission>, AppError> {
    require_capability(&caller, Capability::SetSubmissionStatus)?;
    let req = extract_json(body)?;
    let record = state.archive.set_status(
        SubmissionId::from_uuid(id),
        req.status,
        req.verification_notes,
    )?;
    Ok(Json(record))
}

fn attachment(filename: &str, bytes: Vec<u8>) -> Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        bytes,
    )
        .into_response()
}
