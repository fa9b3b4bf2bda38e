//! # Pipeline Error Taxonomy
//!
//! Typed failures for the staged pipeline. Stage failures carry the exit
//! status and captured diagnostic text of the external program so callers
//! can surface them without re-running anything; they are never retried
//! automatically.

use thiserror::Error;

use crate::stage::Stage;

/// Failures raised by the Artifact Store, Stage Executor, and Orchestrator.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// A stage was invoked out of order, or with an artifact that is
    /// missing, empty, or not issued by this pipeline. The session state
    /// is unchanged.
    #[error("precondition not met for stage '{stage}': {reason}")]
    PreconditionNotMet {
        /// The stage whose precondition failed.
        stage: Stage,
        /// Why the precondition failed.
        reason: String,
    },

    /// A second stage invocation arrived while one was already running for
    /// the same session. The caller should wait and retry.
    #[error("a stage is already in flight for this session")]
    StageInFlight,

    /// The external program exited non-zero or could not be spawned.
    #[error("stage '{stage}' failed (exit status {exit_code:?})")]
    ExternalProcessFailure {
        /// The stage that failed.
        stage: Stage,
        /// The program's exit code, if it ran at all.
        exit_code: Option<i32>,
        /// Captured stdout/stderr of the program.
        diagnostics: String,
    },

    /// The external program exceeded its configured ceiling and was killed.
    #[error("stage '{stage}' timed out after {limit_secs}s")]
    Timeout {
        /// The stage that timed out.
        stage: Stage,
        /// The configured ceiling in seconds.
        limit_secs: u64,
    },

    /// A stage produced no output, an empty output, or output that does
    /// not parse as the expected serialization.
    #[error("malformed artifact from stage '{stage}': {reason}")]
    MalformedArtifact {
        /// The stage whose output was malformed.
        stage: Stage,
        /// Why the artifact was rejected.
        reason: String,
    },

    /// The worker pool was unavailable. Only possible during shutdown.
    #[error("pipeline worker pool unavailable")]
    WorkersUnavailable,

    /// Filesystem failure while staging artifacts.
    #[error("artifact I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    /// The stage this error is attributed to, when one applies.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::PreconditionNotMet { stage, .. }
            | Self::ExternalProcessFailure { stage, .. }
            | Self::Timeout { stage, .. }
            | Self::MalformedArtifact { stage, .. } => Some(*stage),
            Self::StageInFlight | Self::WorkersUnavailable | Self::Io(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_stage() {
        let err = PipelineError::Timeout {
            stage: Stage::Witness,
            limit_secs: 120,
        };
        assert!(err.to_string().contains("witness"));
        assert!(err.to_string().contains("120"));
    }

    #[test]
    fn external_failure_carries_exit_code() {
        let err = PipelineError::ExternalProcessFailure {
            stage: Stage::Prove,
            exit_code: Some(3),
            diagnostics: "bad zkey".into(),
        };
        assert_eq!(err.stage(), Some(Stage::Prove));
        assert!(err.to_string().contains("3"));
    }

    #[test]
    fn in_flight_has_no_stage_attribution() {
        assert_eq!(PipelineError::StageInFlight.stage(), None);
    }
}
