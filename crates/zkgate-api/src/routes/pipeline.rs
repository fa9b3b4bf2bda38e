//! # Pipeline Routes
//!
//! The staged proving flow a subject (or administrator) drives:
//! fingerprint upload → circuit input → witness → proof → submission.
//! Field names on the wire are camelCase, matching the clients this
//! service replaced.

use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use utoipa::ToSchema;

use zkgate_core::{Capability, SubmissionId};

use crate::auth::{require_capability, CallerIdentity};
use crate::error::AppError;
use crate::extractors::{extract_validated_json, Validate};
use crate::state::AppState;

/// Fingerprint uploads: TIFF only, 10 MiB cap.
const FINGERPRINT_BODY_LIMIT: usize = 10 * 1024 * 1024;

/// Response for a fingerprint upload.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadFingerprintResponse {
    /// Where the uploaded image was stored.
    pub file_path: String,
    /// The feature vector the preprocess stage produced.
    pub pkl_file_path: String,
    /// Session state after the stage (e.g. `PREPROCESSED`).
    pub session_state: String,
    /// How many feature vectors the session holds (two are needed).
    pub vectors_held: usize,
}

/// Request to build the circuit input from two feature vectors.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerateCircomInputRequest {
    /// First feature vector path, as returned by the upload endpoint.
    pub pkl_file1: String,
    /// Second feature vector path.
    pub pkl_file2: String,
}

impl Validate for GenerateCircomInputRequest {
    fn validate(&self) -> Result<(), String> {
        if self.pkl_file1.trim().is_empty() || self.pkl_file2.trim().is_empty() {
            return Err("pklFile1 and pklFile2 must not be empty".to_string());
        }
        Ok(())
    }
}

/// Response carrying the circuit input path.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerateCircomInputResponse {
    pub circom_input_file: String,
}

/// Request to compute the witness.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerateWitnessRequest {
    pub circom_input_file: String,
}

impl Validate for GenerateWitnessRequest {
    fn validate(&self) -> Result<(), String> {
        if self.circom_input_file.trim().is_empty() {
            return Err("circomInputFile must not be empty".to_string());
        }
        Ok(())
    }
}

/// Response carrying the witness path.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerateWitnessResponse {
    pub witness_file: String,
}

/// Request to produce the proof.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerateProofRequest {
    pub witness_file: String,
}

impl Validate for GenerateProofRequest {
    fn validate(&self) -> Result<(), String> {
        if self.witness_file.trim().is_empty() {
            return Err("witnessFile must not be empty".to_string());
        }
        Ok(())
    }
}

/// Response for a completed prove stage.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerateProofResponse {
    /// Whether the public input reports a biometric match.
    pub match_found: bool,
    pub proof_path: String,
    pub public_path: String,
}

/// Request to archive the finished proof.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitProofRequest {
    pub proof_path: String,
    pub public_path: String,
}

impl Validate for SubmitProofRequest {
    fn validate(&self) -> Result<(), String> {
        if self.proof_path.trim().is_empty() || self.public_path.trim().is_empty() {
            return Err("proofPath and publicPath must not be empty".to_string());
        }
        Ok(())
    }
}

/// Response for an archived submission.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitProofResponse {
    pub submission_id: SubmissionId,
    pub timestamp: DateTime<Utc>,
}

/// Build the pipeline router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/biometric/upload-fingerprint",
            post(upload_fingerprint).layer(DefaultBodyLimit::max(FINGERPRINT_BODY_LIMIT)),
        )
        .route("/biometric/generate-circom-input", post(generate_circom_input))
        .route("/biometric/generate-witness", post(generate_witness))
        .route("/biometric/generate-proof", post(generate_proof))
        .route("/biometric/submit-proof", post(submit_proof))
}

/// POST /biometric/upload-fingerprint — Upload one TIFF and preprocess it.
#[utoipa::path(
    post,
    path = "/biometric/upload-fingerprint",
    request_body(content = String, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Fingerprint preprocessed", body = UploadFingerprintResponse),
    ),
    tag = "pipeline"
)]
pub async fn upload_fingerprint(
    State(state): State<AppState>,
    caller: CallerIdentity,
    mut multipart: Multipart,
) -> Result<Json<UploadFingerprintResponse>, AppError> {
    require_capability(&caller, Capability::RunPipeline)?;

    let mut image: Option<Vec<u8>> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| AppError::BadRequest(err.body_text()))?
    {
        if field.file_name().is_none() {
            continue;
        }
        if !is_tiff_field(field.content_type(), field.file_name()) {
            return Err(AppError::Validation(
                "fingerprint must be a TIFF image (.tif/.tiff)".into(),
            ));
        }
        let bytes = field
            .bytes()
            .await
            .map_err(|err| AppError::BadRequest(err.body_text()))?;
        image = Some(bytes.to_vec());
        break;
    }
    let image =
        image.ok_or_else(|| AppError::Validation("no fingerprint file in request".into()))?;

    let output = state
        .orchestrator
        .preprocess(caller.owner_id(), &image)
        .await?;
    Ok(Json(UploadFingerprintResponse {
        file_path: output.image.display().to_string(),
        pkl_file_path: output.feature_vector.display().to_string(),
        session_state: output.state.as_str().to_string(),
        vectors_held: output.vectors_held,
    }))
}

/// POST /biometric/generate-circom-input — Build the circuit input from
/// two feature vectors.
#[utoipa::path(
    post,
    path = "/biometric/generate-circom-input",
    request_body = GenerateCircomInputRequest,
    responses(
        (status = 200, description = "Circuit input built", body = GenerateCircomInputResponse),
    ),
    tag = "pipeline"
)]
pub async fn generate_circom_input(
    State(state): State<AppState>,
    caller: CallerIdentity,
    body: Result<Json<GenerateCircomInputRequest>, JsonRejection>,
) -> Result<Json<GenerateCircomInputResponse>, AppError> {
    require_capability(&caller, Capability::RunPipeline)?;
    let req = extract_validated_json(body)?;

    let output = state
        .orchestrator
        .build_circuit_input(
            caller.owner_id(),
            PathBuf::from(req.pkl_file1),
            PathBuf::from(req.pkl_file2),
        )
        .await?;
    Ok(Json(GenerateCircomInputResponse {
        circom_input_file: output.display().to_string(),
    }))
}

/// POST /biometric/generate-witness — Compute the witness.
#[utoipa::path(
    post,
    path = "/biometric/generate-witness",
    request_body = GenerateWitnessRequest,
    responses(
        (status = 200, description = "Witness computed", body = GenerateWitnessResponse),
    ),
    tag = "pipeline"
)]
pub async fn generate_witness(
    State(state): State<AppState>,
    caller: CallerIdentity,
    body: Result<Json<GenerateWitnessRequest>, JsonRejection>,
) -> Result<Json<GenerateWitnessResponse>, AppError> {
    require_capability(&caller, Capability::RunPipeline)?;
    let req = extract_validated_json(body)?;

    let output = state
        .orchestrator
        .generate_witness(caller.owner_id(), PathBuf::from(req.circom_input_file))
        .await?;
    Ok(Json(GenerateWitnessResponse {
        witness_file: output.display().to_string(),
    }))
}

/// POST /biometric/generate-proof — Produce the Groth16 proof and decode
/// the match flag.
#[utoipa::path(
    post,
    path = "/biometric/generate-proof",
    request_body = GenerateProofRequest,
    responses(
        (status = 200, description = "Proof produced", body = GenerateProofResponse),
    ),
    tag = "pipeline"
)]
pub async fn generate_proof(
    State(state): State<AppState>,
    caller: CallerIdentity,
    body: Result<Json<GenerateProofRequest>, JsonRejection>,
) -> Result<Json<GenerateProofResponse>, AppError> {
    require_capability(&caller, Capability::RunPipeline)?;
    let req = extract_validated_json(body)?;

    let output = state
        .orchestrator
        .generate_proof(caller.owner_id(), PathBuf::from(req.witness_file))
        .await?;
    Ok(Json(GenerateProofResponse {
        match_found: output.match_found,
        proof_path: output.proof.display().to_string(),
        public_path: output.public_input.display().to_string(),
    }))
}

/// POST /biometric/submit-proof — Archive the finished proof.
///
/// The submitted paths must be the session's own finished artifacts; the
/// session is closed only after the archive accepts the blobs, so a
/// rejected submission can be retried.
#[utoipa::path(
    post,
    path = "/biometric/submit-proof",
    request_body = SubmitProofRequest,
    responses(
        (status = 201, description = "Proof archived", body = SubmitProofResponse),
    ),
    tag = "pipeline"
)]
pub async fn submit_proof(
    State(state): State<AppState>,
    caller: CallerIdentity,
    body: Result<Json<SubmitProofRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SubmitProofResponse>), AppError> {
    require_capability(&caller, Capability::SubmitProof)?;
    let req = extract_validated_json(body)?;
    let owner = caller.owner_id();

    let session = state
        .orchestrator
        .session(owner)
        .ok_or_else(|| AppError::PreconditionNotMet("no active pipeline session".into()))?;
    let proof_path = PathBuf::from(&req.proof_path);
    let public_path = PathBuf::from(&req.public_path);
    if session.proof.as_ref() != Some(&proof_path)
        || session.public_input.as_ref() != Some(&public_path)
    {
        return Err(AppError::PreconditionNotMet(
            "submitted paths do not match the session's finished proof".into(),
        ));
    }

    let completed = state.orchestrator.completed_proof(owner)?;
    let record = state.archive.submit(
        owner,
        state.display_name(owner),
        completed.match_found,
        completed.proof,
        completed.public_input,
    )?;
    state.orchestrator.mark_submitted(owner)?;

    Ok((
        StatusCode::CREATED,
        Json(SubmitProofResponse {
            submission_id: record.id,
            timestamp: record.submitted_at,
        }),
    ))
}

fn is_tiff_field(content_type: Option<&str>, file_name: Option<&str>) -> bool {
    if let Some(ct) = content_type {
        if ct.eq_ignore_ascii_case("image/tiff") || ct.eq_ignore_ascii_case("image/tif") {
            return true;
        }
    }
    if let Some(name) = file_name {
        let lower = name.to_lowercase();
        return lower.ends_with(".tif") || lower.ends_with(".tiff");
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiff_detection_accepts_type_or_extension() {
        assert!(is_tiff_field(Some("image/tiff"), Some("scan.bin")));
        assert!(is_tiff_field(None, Some("scan.TIF")));
        assert!(is_tiff_field(None, Some("scan.tiff")));
        assert!(!is_tiff_field(Some("image/png"), Some("scan.png")));
        assert!(!is_tiff_field(None, None));
    }

    #[test]
    fn request_validation_rejects_blank_paths() {
        let req = GenerateCircomInputRequest {
            pkl_file1: " ".into(),
            pkl_file2: "/data/work/features-b.pkl".into(),
        };
        assert!(req.validate().is_err());

        let req = GenerateWitnessRequest {
            circom_input_file: String::new(),
        };
        assert!(req.validate().is_err());
    }
}
