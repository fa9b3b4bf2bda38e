//! # Pipeline Stages & Session States
//!
//! The pipeline is a fixed directed path. Each work [`Stage`] is backed by
//! one external computation; each successful stage advances its session to
//! the corresponding [`SessionState`].
//!
//! ```text
//! START ─Preprocess─▶ PREPROCESSED ─CircuitInput─▶ CIRCUIT_INPUT_READY
//!        ─Witness─▶ WITNESS_READY ─Prove─▶ PROOF_READY ─submit─▶ SUBMITTED
//! ```
//!
//! Transitions are strictly forward. The Preprocess stage is the only one
//! that may run from two states (`START` and `PREPROCESSED`), because it
//! processes one fingerprint sample per invocation and a run needs two.

use serde::{Deserialize, Serialize};

/// One ordered step of the verification pipeline, each backed by an
/// external tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Extract a serialized feature vector from one fingerprint image.
    Preprocess,
    /// Compare two feature vectors and build the circuit input.
    CircuitInput,
    /// Compute the witness from the circuit input.
    Witness,
    /// Produce the Groth16 proof and public-input list from the witness.
    Prove,
}

impl Stage {
    /// The canonical stage name as it appears in errors and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Preprocess => "preprocess",
            Self::CircuitInput => "circuit_input",
            Self::Witness => "witness",
            Self::Prove => "prove",
        }
    }

    /// Session states from which this stage may be invoked.
    pub fn runs_from(&self) -> &'static [SessionState] {
        match self {
            Self::Preprocess => &[SessionState::Start, SessionState::Preprocessed],
            Self::CircuitInput => &[SessionState::Preprocessed],
            Self::Witness => &[SessionState::CircuitInputReady],
            Self::Prove => &[SessionState::WitnessReady],
        }
    }

    /// The session state a successful run of this stage produces.
    pub fn produces(&self) -> SessionState {
        match self {
            Self::Preprocess => SessionState::Preprocessed,
            Self::CircuitInput => SessionState::CircuitInputReady,
            Self::Witness => SessionState::WitnessReady,
            Self::Prove => SessionState::ProofReady,
        }
    }

    /// Whether this stage may be invoked while the session is in `state`.
    pub fn permitted_from(&self, state: SessionState) -> bool {
        self.runs_from().contains(&state)
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state of one pipeline session.
///
/// Serialized `SCREAMING_SNAKE_CASE` so stored and logged states cannot
/// drift into ad-hoc strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionState {
    /// Session created; no artifacts yet.
    Start,
    /// At least one feature vector produced.
    Preprocessed,
    /// Circuit input built from two feature vectors.
    CircuitInputReady,
    /// Witness computed.
    WitnessReady,
    /// Proof and public input produced; ready to archive.
    ProofReady,
    /// Proof archived. Terminal.
    Submitted,
}

impl SessionState {
    /// The canonical state name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "START",
            Self::Preprocessed => "PREPROCESSED",
            Self::CircuitInputReady => "CIRCUIT_INPUT_READY",
            Self::WitnessReady => "WITNESS_READY",
            Self::ProofReady => "PROOF_READY",
            Self::Submitted => "SUBMITTED",
        }
    }

    /// Whether this is a terminal state (no further transitions).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Submitted)
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_STAGES: [Stage; 4] = [
        Stage::Preprocess,
        Stage::CircuitInput,
        Stage::Witness,
        Stage::Prove,
    ];

    const ALL_STATES: [SessionState; 6] = [
        SessionState::Start,
        SessionState::Preprocessed,
        SessionState::CircuitInputReady,
        SessionState::WitnessReady,
        SessionState::ProofReady,
        SessionState::Submitted,
    ];

    #[test]
    fn pipeline_path_is_strictly_forward() {
        assert_eq!(Stage::Preprocess.produces(), SessionState::Preprocessed);
        assert_eq!(Stage::CircuitInput.produces(), SessionState::CircuitInputReady);
        assert_eq!(Stage::Witness.produces(), SessionState::WitnessReady);
        assert_eq!(Stage::Prove.produces(), SessionState::ProofReady);
    }

    #[test]
    fn preprocess_accepts_a_second_sample() {
        assert!(Stage::Preprocess.permitted_from(SessionState::Start));
        assert!(Stage::Preprocess.permitted_from(SessionState::Preprocessed));
        assert!(!Stage::Preprocess.permitted_from(SessionState::CircuitInputReady));
    }

    #[test]
    fn no_stage_runs_from_terminal_or_future_states() {
        // Leaving PROOF_READY requires an explicit session reset, which is
        // the orchestrator's job, not a stage transition.
        for stage in ALL_STAGES {
            assert!(!stage.permitted_from(SessionState::ProofReady), "stage {stage}");
            assert!(!stage.permitted_from(SessionState::Submitted), "stage {stage}");
        }
    }

    #[test]
    fn each_stage_runs_only_from_its_prerequisite() {
        for stage in ALL_STAGES {
            for state in ALL_STATES {
                let permitted = stage.permitted_from(state);
                let expected = stage.runs_from().contains(&state);
                assert_eq!(permitted, expected, "stage {stage} from {state}");
            }
        }
        // Skipping a stage is never permitted.
        assert!(!Stage::Witness.permitted_from(SessionState::Preprocessed));
        assert!(!Stage::Prove.permitted_from(SessionState::CircuitInputReady));
    }

    #[test]
    fn only_submitted_is_terminal() {
        for state in ALL_STATES {
            assert_eq!(state.is_terminal(), state == SessionState::Submitted);
        }
    }

    #[test]
    fn state_names_are_spec_aligned() {
        assert_eq!(SessionState::CircuitInputReady.as_str(), "CIRCUIT_INPUT_READY");
        let json = serde_json::to_string(&SessionState::ProofReady).unwrap();
        assert_eq!(json, "\"PROOF_READY\"");
    }
}
