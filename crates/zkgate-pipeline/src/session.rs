//! # Pipeline Sessions
//!
//! One [`Session`] tracks one run of the pipeline for one owning identity.
//! Sessions are ephemeral — they live in orchestrator memory for the
//! process lifetime and are discarded once a submission is archived or the
//! owner starts over.
//!
//! Every state change is appended to the session's transition log, giving
//! a per-run audit trail of when each stage completed.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use zkgate_core::{SessionId, UserId};

use crate::stage::{SessionState, Stage};

/// A record of one state transition within a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionRecord {
    /// State before the transition.
    pub from_state: SessionState,
    /// State after the transition.
    pub to_state: SessionState,
    /// The stage whose completion caused the transition, if any
    /// (`None` for the submit transition).
    pub stage: Option<Stage>,
    /// When the transition occurred.
    pub timestamp: DateTime<Utc>,
}

/// One pipeline run. Mutated only by the orchestrator.
#[derive(Debug, Clone)]
pub struct Session {
    /// Unique session identifier.
    pub id: SessionId,
    /// The identity driving this run.
    pub owner: UserId,
    /// Current lifecycle state.
    pub state: SessionState,
    /// Raw fingerprint uploads received during this run.
    pub uploads: Vec<PathBuf>,
    /// Feature-vector artifacts produced so far (at most two; a third
    /// preprocess run replaces the older of the pair).
    pub feature_vectors: Vec<PathBuf>,
    /// Circuit input artifact, once built.
    pub circuit_input: Option<PathBuf>,
    /// Witness artifact, once computed.
    pub witness: Option<PathBuf>,
    /// Proof artifact, once produced.
    pub proof: Option<PathBuf>,
    /// Public-input artifact, once produced.
    pub public_input: Option<PathBuf>,
    /// Match flag decoded from the public input at the Prove stage.
    pub match_found: Option<bool>,
    /// Whether a stage invocation is currently in flight.
    pub busy: bool,
    /// Audit trail of state transitions.
    pub transition_log: Vec<TransitionRecord>,
    /// When the session was created.
    pub created_at: DateTime<Utc>,
    /// When the session last changed.
    pub updated_at: DateTime<Utc>,
}

impl Session {
    /// Create a fresh session in the `START` state.
    pub fn new(owner: UserId) -> Self {
        let now = Utc::now();
        Self {
            id: SessionId::new(),
            owner,
            state: SessionState::Start,
            uploads: Vec::new(),
            feature_vectors: Vec::new(),
            circuit_input: None,
            witness: None,
            proof: None,
            public_input: None,
            match_found: None,
            busy: false,
            transition_log: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Advance to `to`, recording the transition.
    ///
    /// Callers (the orchestrator) validate legality first; this method
    /// only records.
    pub fn advance(&mut self, to: SessionState, stage: Option<Stage>) {
        let from = self.state;
        self.transition_log.push(TransitionRecord {
            from_state: from,
            to_state: to,
            stage,
            timestamp: Utc::now(),
        });
        self.state = to;
        self.updated_at = Utc::now();
    }

    /// Record a freshly produced feature vector, keeping at most the two
    /// most recent ones (the pipeline compares exactly two samples).
    /// Returns the evicted vector, if a third push displaced one.
    pub fn push_feature_vector(&mut self, path: PathBuf) -> Option<PathBuf> {
        self.feature_vectors.push(path);
        self.updated_at = Utc::now();
        if self.feature_vectors.len() > 2 {
            Some(self.feature_vectors.remove(0))
        } else {
            None
        }
    }

    /// Every path this session has accumulated, uploads included. Used to
    /// release store registrations when the session is discarded.
    pub fn artifacts(&self) -> Vec<PathBuf> {
        self.uploads
            .iter()
            .chain(self.feature_vectors.iter())
            .chain(self.circuit_input.iter())
            .chain(self.witness.iter())
            .chain(self.proof.iter())
            .chain(self.public_input.iter())
            .cloned()
            .collect()
    }

    /// Whether `path` is one of this session's recorded artifacts.
    pub fn owns_artifact(&self, path: &std::path::Path) -> bool {
        self.feature_vectors.iter().any(|p| p == path)
            || self.circuit_input.as_deref() == Some(path)
            || self.witness.as_deref() == Some(path)
            || self.proof.as_deref() == Some(path)
            || self.public_input.as_deref() == Some(path)
    }
}
