//! # Roles & Capability Table
//!
//! The single authorization table for the whole stack. Roles are NOT a
//! privilege lattice: a reviewer can do things an administrator cannot
//! (inspect the archive) and vice versa (run the pipeline, manage users).
//! Every authorization decision goes through [`Role::allows`] so the table
//! cannot drift between endpoints.
//!
//! | Capability            | administrator | subject | reviewer |
//! |-----------------------|---------------|---------|----------|
//! | `RunPipeline`         | yes           | yes     | no       |
//! | `SubmitProof`         | yes           | yes     | no       |
//! | `ReviewArchive`       | no            | no      | yes      |
//! | `SetSubmissionStatus` | no            | no      | yes      |
//! | `RunVerification`     | no            | no      | yes      |
//! | `ManageUsers`         | yes           | no      | no       |

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Roles in ZKGate. Exactly one role per identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Operates the service: runs the pipeline, submits proofs, and
    /// manages the user directory.
    Administrator,
    /// A staff member verifying their own identity: runs the pipeline and
    /// submits proofs.
    Subject,
    /// An auditor: inspects and adjudicates archived submissions and runs
    /// stand-alone verification. Cannot touch the pipeline.
    Reviewer,
}

impl Role {
    /// Return the string representation of this role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Administrator => "administrator",
            Self::Subject => "subject",
            Self::Reviewer => "reviewer",
        }
    }

    /// Parse a role from its string representation.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "administrator" => Some(Self::Administrator),
            "subject" => Some(Self::Subject),
            "reviewer" => Some(Self::Reviewer),
            _ => None,
        }
    }

    /// Whether this role grants the given capability.
    pub fn allows(&self, capability: Capability) -> bool {
        use Capability::*;
        match self {
            Self::Administrator => matches!(capability, RunPipeline | SubmitProof | ManageUsers),
            Self::Subject => matches!(capability, RunPipeline | SubmitProof),
            Self::Reviewer => {
                matches!(capability, ReviewArchive | SetSubmissionStatus | RunVerification)
            }
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One gated operation class from the capability table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Drive pipeline stages (upload, circuit input, witness, proof).
    RunPipeline,
    /// Archive a completed proof.
    SubmitProof,
    /// List, view, and download archived submissions.
    ReviewArchive,
    /// Adjudicate a submission (set status + notes).
    SetSubmissionStatus,
    /// Run stand-alone verification against an arbitrary proof pair.
    RunVerification,
    /// Create and remove identities in the user directory.
    ManageUsers,
}

impl Capability {
    /// Return the string representation of this capability, used in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RunPipeline => "run_pipeline",
            Self::SubmitProof => "submit_proof",
            Self::ReviewArchive => "review_archive",
            Self::SetSubmissionStatus => "set_submission_status",
            Self::RunVerification => "run_verification",
            Self::ManageUsers => "manage_users",
        }
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
