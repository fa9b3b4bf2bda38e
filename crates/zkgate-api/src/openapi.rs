//! # OpenAPI Specification Assembly
//!
//! Assembles all utoipa-documented routes into a single OpenAPI spec,
//! served at `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::state::AppState;

/// Assembled OpenAPI spec for the entire API surface.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "ZKGate API — Biometric Identity Verification",
        version = "0.3.2",
        description = "Staged fingerprint-to-Groth16 pipeline, proof archive with reviewer workflow, and stand-alone proof verification.",
        license(name = "AGPL-3.0-or-later")
    ),
    paths(
        // Pipeline
        crate::routes::pipeline::upload_fingerprint,
        crate::routes::pipeline::generate_circom_input,
        crate::routes::pipeline::generate_witness,
        crate::routes::pipeline::generate_proof,
        crate::routes::pipeline::submit_proof,
        // Archive
        crate::routes::archive::list_submissions,
        crate::routes::archive::get_submission,
        crate::routes::archive::download_proof,
        crate::routes::archive::download_public,
        crate::routes::archive::set_status,
        // Verification
        crate::routes::verify::verify_zkp,
        // User directory
        crate::routes::users::create_user,
        crate::routes::users::list_users,
        crate::routes::users::get_user,
        crate::routes::users::remove_user,
    ),
    components(schemas(
        crate::error::ErrorBody,
        crate::error::ErrorDetail,
        crate::routes::pipeline::UploadFingerprintResponse,
        crate::routes::pipeline::GenerateCircomInputRequest,
        crate::routes::pipeline::GenerateCircomInputResponse,
        crate::routes::pipeline::GenerateWitnessRequest,
        crate::routes::pipeline::GenerateWitnessResponse,
        crate::routes::pipeline::GenerateProofRequest,
        crate::routes::pipeline::GenerateProofResponse,
        crate::routes::pipeline::SubmitProofRequest,
        crate::routes::pipeline::SubmitProofResponse,
        crate::routes::archive::SetStatusRequest,
        crate::routes::users::CreateUserRequest,
        crate::state::UserRecord,
        zkgate_archive::ProofSubmission,
        zkgate_archive::SubmissionStatus,
        zkgate_core::Role,
        zkgate_verify::Verdict,
    )),
    tags(
        (name = "pipeline", description = "Staged proving pipeline"),
        (name = "archive", description = "Proof archive and review workflow"),
        (name = "verify", description = "Stand-alone proof verification"),
        (name = "users", description = "User directory"),
    )
)]
pub struct ApiDoc;

/// Router serving the generated spec.
pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(serve_openapi))
}

async fn serve_openapi() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
