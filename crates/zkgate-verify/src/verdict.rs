use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Outcome of checking one archived proof.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Verdict {
    /// Whether the cryptographic check passed.
    pub verified: bool,
    /// Whether the failure points at corrupted or altered artifacts. An
    /// honest non-match, a missing verification key, or a timeout is not
    /// tampering.
    pub tampered: bool,
    /// One-line human-readable summary.
    pub message: String,
    /// Checker diagnostics, when any were captured.
    pub details: Option<String>,
}

impl Verdict {
    /// The proof checked out.
    pub fn verified() -> Self {
        Self {
            verified: true,
            tampered: false,
            message: "proof verified against the circuit verification key".to_owned(),
            details: None,
        }
    }

    /// The check ran cleanly and the proof simply does not verify.
    pub fn clean_failure(message: impl Into<String>) -> Self {
        Self {
            verified: false,
            tampered: false,
            message: message.into(),
            details: None,
        }
    }

    /// The failure indicates corrupted or altered artifacts.
    pub fn tampered(message: impl Into<String>, details: Option<String>) -> Self {
        Self {
            verified: false,
            tampered: true,
            message: message.into(),
            details,
        }
    }
}
