//! # Verification Routes
//!
//! Stand-alone proof checking over an uploaded proof/public pair. The
//! pair may come from an archive download or from anywhere else; the
//! service is read-only either way.

use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::routing::post;
use axum::{Json, Router};

use zkgate_core::Capability;
use zkgate_verify::Verdict;

use crate::auth::{require_capability, CallerIdentity};
use crate::error::AppError;
use crate::state::AppState;

/// Proof/public uploads: JSON only, 5 MiB cap.
const PROOF_BODY_LIMIT: usize = 5 * 1024 * 1024;

/// Build the verification router.
pub fn router() -> Router<AppState> {
    Router::new().route(
        "/biometric/verify-zkp",
        post(verify_zkp).layer(DefaultBodyLimit::max(PROOF_BODY_LIMIT)),
    )
}

/// POST /biometric/verify-zkp — Check a proof/public pair.
///
/// Multipart with two JSON file fields, `proof` and `public`. An invalid
/// proof is a 200 with `verified=false`; only infrastructure failures are
/// 5xx.
#[utoipa::path(
    post,
    path = "/biometric/verify-zkp",
    request_body(content = String, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Classification verdict", body = Verdict),
    ),
    tag = "verify"
)]
pub async fn verify_zkp(
    State(state): State<AppState>,
    caller: CallerIdentity,
    mut multipart: Multipart,
) -> Result<Json<Verdict>, AppError> {
    require_capability(&caller, Capability::RunVerification)?;

    let mut proof: Option<Vec<u8>> = None;
    let mut public: Option<Vec<u8>> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| AppError::BadRequest(err.body_text()))?
    {
        let name = field.name().map(str::to_owned);
        if !is_json_field(field.content_type(), field.file_name()) {
            return Err(AppError::Validation(
                "proof and public files must be JSON".into(),
            ));
        }
        let bytes = field
            .bytes()
            .await
            .map_err(|err| AppError::BadRequest(err.body_text()))?;
        match name.as_deref() {
            Some("proof") => proof = Some(bytes.to_vec()),
            Some("public") => public = Some(bytes.to_vec()),
            _ => {}
        }
    }

    let proof = proof.ok_or_else(|| AppError::Validation("missing 'proof' file field".into()))?;
    let public =
        public.ok_or_else(|| AppError::Validation("missing 'public' file field".into()))?;

    let verdict = state.verifier.verify(&proof, &public).await?;
    Ok(Json(verdict))
}

fn is_json_field(content_type: Option<&str>, file_name: Option<&str>) -> bool {
    if let Some(ct) = content_type {
        if ct.eq_ignore_ascii_case("application/json") {
            return true;
        }
    }
    if let Some(name) = file_name {
        return name.to_lowercase().ends_with(".json");
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_detection_accepts_type_or_extension() {
        assert!(is_json_field(Some("application/json"), None));
        assert!(is_json_field(None, Some("proof.JSON")));
        assert!(!is_json_field(Some("text/plain"), Some("proof.txt")));
        assert!(!is_json_field(None, None));
    }
}
