use thiserror::Error;

use crate::submission::SubmissionStatus;

/// Failures raised by the proof archive.
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// No submission exists with the given identifier.
    #[error("submission not found: {0}")]
    NotFound(String),

    /// An incoming blob did not have the expected shape (proofs must be
    /// JSON objects, public inputs a JSON array of decimal strings).
    #[error("invalid {blob} blob: {reason}")]
    InvalidBlob {
        /// Which blob was rejected (`proof` or `public input`).
        blob: &'static str,
        /// Why it was rejected.
        reason: String,
    },

    /// The requested status change is not a legal workflow transition.
    #[error("cannot move submission from '{from}' to '{to}'")]
    InvalidTransition {
        /// Current status.
        from: SubmissionStatus,
        /// Requested status.
        to: SubmissionStatus,
    },

    /// A stored blob no longer matches the digest recorded at submission
    /// time.
    #[error("stored {blob} blob failed its digest check")]
    DigestMismatch {
        /// Which blob failed (`proof` or `public input`).
        blob: &'static str,
    },
}
