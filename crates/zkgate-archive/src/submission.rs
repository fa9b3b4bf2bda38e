use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use zkgate_core::{SubmissionId, UserId};

/// Review status of an archived submission.
///
/// ```text
/// pending ──▶ verified
///    ▲  └───▶ rejected
///    └──────────┘  (re-open)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    /// Awaiting reviewer decision.
    Pending,
    /// A reviewer confirmed the proof.
    Verified,
    /// A reviewer rejected the proof.
    Rejected,
}

impl SubmissionStatus {
    /// Stable lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Verified => "verified",
            Self::Rejected => "rejected",
        }
    }

    /// Whether the workflow permits moving from `self` to `to`. A decided
    /// submission can only be re-opened, never flipped directly to the
    /// other decision.
    pub fn can_transition_to(&self, to: SubmissionStatus) -> bool {
        match (self, to) {
            (Self::Pending, Self::Verified) | (Self::Pending, Self::Rejected) => true,
            (Self::Verified, Self::Pending) | (Self::Rejected, Self::Pending) => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata for one archived proof. Blobs live beside the record in the
/// archive and are fetched separately.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProofSubmission {
    /// Archive-assigned identifier.
    pub id: SubmissionId,
    /// The subject the proof is about.
    pub user_id: UserId,
    /// Display name captured at submission time.
    pub user_name: String,
    /// When the proof was archived.
    pub submitted_at: DateTime<Utc>,
    /// Match flag the pipeline decoded from the public input.
    pub match_found: bool,
    /// Current review status.
    pub status: SubmissionStatus,
    /// Reviewer notes, set together with the status decision.
    pub verification_notes: Option<String>,
    /// SHA-256 of the proof blob, hex-encoded.
    pub proof_digest: String,
    /// SHA-256 of the public-input blob, hex-encoded.
    pub public_digest: String,
}
