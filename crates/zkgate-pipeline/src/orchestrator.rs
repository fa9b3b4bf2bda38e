//! # Pipeline Orchestrator
//!
//! Owns every session and drives stages through the [`StageExecutor`].
//! The orchestrator enforces three things the executor cannot:
//!
//! 1. **Ordering** — a stage runs only from the states
//!    [`Stage::runs_from`] permits, and only over artifacts this
//!    pipeline issued.
//! 2. **One stage in flight per session** — a second invocation for the
//!    same owner fails fast with [`PipelineError::StageInFlight`] instead
//!    of queueing.
//! 3. **Bounded fan-out** — a global semaphore caps how many external
//!    processes run at once across all sessions.
//!
//! A failed stage clears the in-flight flag and leaves the session at its
//! last completed state, so the caller can retry into fresh output paths.
//! The flag is cleared by a drop guard, so a request abandoned mid-stage
//! (client disconnect, caller-side timeout) cannot leave the session
//! stuck in flight.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::Semaphore;
use tracing::{info, warn};

use zkgate_core::{SessionId, UserId};

use crate::artifact::{ArtifactError, ArtifactKind, ArtifactStore};
use crate::error::PipelineError;
use crate::executor::{StageExecutor, StageInvocation};
use crate::session::Session;
use crate::stage::{SessionState, Stage};

/// Result of a completed preprocess stage.
#[derive(Debug, Clone)]
pub struct PreprocessOutput {
    /// The session this upload was applied to.
    pub session: SessionId,
    /// Session state after the stage.
    pub state: SessionState,
    /// Store-issued path the uploaded image was saved under.
    pub image: PathBuf,
    /// Store-issued path of the produced feature vector.
    pub feature_vector: PathBuf,
    /// How many feature vectors the session now holds (1 or 2).
    pub vectors_held: usize,
}

/// Result of a completed prove stage.
#[derive(Debug, Clone)]
pub struct ProveOutput {
    /// The session the proof belongs to.
    pub session: SessionId,
    /// Store-issued path of the Groth16 proof JSON.
    pub proof: PathBuf,
    /// Store-issued path of the public-input JSON.
    pub public_input: PathBuf,
    /// Match flag decoded from the first public signal.
    pub match_found: bool,
}

/// A finished proof read back into memory, ready for archival.
#[derive(Debug, Clone)]
pub struct CompletedProof {
    /// The session the proof came from.
    pub session: SessionId,
    /// Groth16 proof JSON bytes.
    pub proof: Vec<u8>,
    /// Public-input JSON bytes.
    pub public_input: Vec<u8>,
    /// Match flag decoded at prove time.
    pub match_found: bool,
}

/// Clears the owner's in-flight flag when dropped. Every stage method
/// holds one across the executor await: if the caller's future is dropped
/// mid-stage, the guard still runs and the session stays usable.
struct BusyGuard<'a> {
    sessions: &'a RwLock<HashMap<UserId, Session>>,
    owner: UserId,
    armed: bool,
}

impl BusyGuard<'_> {
    /// Consume the guard without touching the session. Call only after
    /// the flag has been cleared under the sessions lock; drop would
    /// otherwise re-take that lock.
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        if let Some(session) = self.sessions.write().get_mut(&self.owner) {
            session.busy = false;
        }
    }
}

/// Coordinates the staged pipeline across all sessions.
pub struct PipelineOrchestrator {
    store: ArtifactStore,
    executor: Arc<dyn StageExecutor>,
    sessions: RwLock<HashMap<UserId, Session>>,
    process_slots: Arc<Semaphore>,
}

impl PipelineOrchestrator {
    /// Build an orchestrator over `store` and `executor`, allowing at most
    /// `max_concurrent` external processes in flight at once.
    pub fn new(store: ArtifactStore, executor: Arc<dyn StageExecutor>, max_concurrent: usize) -> Self {
        Self {
            store,
            executor,
            sessions: RwLock::new(HashMap::new()),
            process_slots: Arc::new(Semaphore::new(max_concurrent.max(1))),
        }
    }

    /// The staging store backing this orchestrator.
    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Snapshot of the owner's current session, if one exists.
    pub fn session(&self, owner: UserId) -> Option<Session> {
        self.sessions.read().get(&owner).cloned()
    }

    /// Run the preprocess stage over an uploaded fingerprint image.
    ///
    /// Starting over is implicit: an upload that arrives after the session
    /// has moved past `PREPROCESSED` discards the session and begins a
    /// fresh run for the same owner.
    pub async fn preprocess(
        &self,
        owner: UserId,
        image_bytes: &[u8],
    ) -> Result<PreprocessOutput, PipelineError> {
        {
            let mut sessions = self.sessions.write();
            let session = sessions.entry(owner).or_insert_with(|| Session::new(owner));
            if session.busy {
                return Err(PipelineError::StageInFlight);
            }
            if !Stage::Preprocess.permitted_from(session.state) {
                info!(
                    session = %session.id,
                    from = session.state.as_str(),
                    "upload received past preprocessing; starting session over"
                );
                let stale = std::mem::replace(session, Session::new(owner));
                for path in stale.artifacts() {
                    self.store.release(&path);
                }
            }
            session.busy = true;
        }
        let guard = BusyGuard {
            sessions: &self.sessions,
            owner,
            armed: true,
        };

        let image = self
            .store
            .save_upload(ArtifactKind::FingerprintImage, image_bytes)
            .map_err(|err| precondition(Stage::Preprocess, err))?;
        let output = self.store.allocate(ArtifactKind::FeatureVector);

        let result = self
            .run_stage(Stage::Preprocess, vec![image.clone()], vec![output.clone()])
            .await;

        let mut sessions = self.sessions.write();
        let session = sessions
            .get_mut(&owner)
            .ok_or(PipelineError::WorkersUnavailable)?;
        session.busy = false;
        session.uploads.push(image.clone());
        guard.disarm();
        let outcome = (|| {
            result?;
            self.require_output(Stage::Preprocess, &output)
        })();
        if let Err(err) = outcome {
            self.store.release(&output);
            return Err(err);
        }

        if let Some(evicted) = session.push_feature_vector(output.clone()) {
            self.store.release(&evicted);
        }
        session.advance(SessionState::Preprocessed, Some(Stage::Preprocess));
        Ok(PreprocessOutput {
            session: session.id,
            state: session.state,
            image,
            feature_vector: output,
            vectors_held: session.feature_vectors.len(),
        })
    }

    /// Build the circuit input from two previously produced feature
    /// vectors. Both paths must belong to the owner's session.
    pub async fn build_circuit_input(
        &self,
        owner: UserId,
        first: PathBuf,
        second: PathBuf,
    ) -> Result<PathBuf, PipelineError> {
        let guard = self.begin_stage(owner, Stage::CircuitInput, &[&first, &second])?;
        let output = self.store.allocate(ArtifactKind::CircuitInput);

        let result = self
            .run_stage(
                Stage::CircuitInput,
                vec![first, second],
                vec![output.clone()],
            )
            .await;

        self.finish_stage(guard, Stage::CircuitInput, result, &output, |session| {
            session.circuit_input = Some(output.clone());
        })?;
        Ok(output)
    }

    /// Compute the witness from the circuit input.
    pub async fn generate_witness(
        &self,
        owner: UserId,
        circuit_input: PathBuf,
    ) -> Result<PathBuf, PipelineError> {
        let guard = self.begin_stage(owner, Stage::Witness, &[&circuit_input])?;
        let output = self.store.allocate(ArtifactKind::Witness);

        let result = self
            .run_stage(Stage::Witness, vec![circuit_input], vec![output.clone()])
            .await;

        self.finish_stage(guard, Stage::Witness, result, &output, |session| {
            session.witness = Some(output.clone());
        })?;
        Ok(output)
    }

    /// Produce the Groth16 proof and public input from the witness, and
    /// decode the match flag from the first public signal.
    pub async fn generate_proof(
        &self,
        owner: UserId,
        witness: PathBuf,
    ) -> Result<ProveOutput, PipelineError> {
        let guard = self.begin_stage(owner, Stage::Prove, &[&witness])?;
        let proof = self.store.allocate(ArtifactKind::Proof);
        let public = self.store.allocate(ArtifactKind::PublicInput);

        let result = self
            .run_stage(
                Stage::Prove,
                vec![witness],
                vec![proof.clone(), public.clone()],
            )
            .await;

        // The prove stage has two outputs and a decode step, so it does
        // not share finish_stage with the single-output stages.
        let decode = (|| {
            result?;
            self.require_output(Stage::Prove, &proof)?;
            self.require_output(Stage::Prove, &public)?;
            let bytes = self
                .store
                .read(&public)
                .map_err(|err| malformed(Stage::Prove, err))?;
            decode_match_flag(&bytes)
        })();

        let mut sessions = self.sessions.write();
        let session = sessions
            .get_mut(&owner)
            .ok_or(PipelineError::WorkersUnavailable)?;
        session.busy = false;
        guard.disarm();
        let match_found = match decode {
            Ok(flag) => flag,
            Err(err) => {
                self.store.release(&proof);
                self.store.release(&public);
                return Err(err);
            }
        };

        session.proof = Some(proof.clone());
        session.public_input = Some(public.clone());
        session.match_found = Some(match_found);
        session.advance(SessionState::ProofReady, Some(Stage::Prove));
        info!(session = %session.id, match_found, "proof ready");
        Ok(ProveOutput {
            session: session.id,
            proof,
            public_input: public,
            match_found,
        })
    }

    /// Read the finished proof back for archival. The session must be at
    /// `PROOF_READY`; it is left untouched so a failed archive submission
    /// can be retried.
    pub fn completed_proof(&self, owner: UserId) -> Result<CompletedProof, PipelineError> {
        let (session_id, proof_path, public_path, match_found) = {
            let sessions = self.sessions.read();
            let session = sessions.get(&owner).ok_or_else(|| no_session(Stage::Prove))?;
            if session.state != SessionState::ProofReady {
                return Err(PipelineError::PreconditionNotMet {
                    stage: Stage::Prove,
                    reason: format!(
                        "no finished proof to submit (session is at {})",
                        session.state.as_str()
                    ),
                });
            }
            let proof = session
                .proof
                .clone()
                .ok_or_else(|| no_session(Stage::Prove))?;
            let public = session
                .public_input
                .clone()
                .ok_or_else(|| no_session(Stage::Prove))?;
            (session.id, proof, public, session.match_found.unwrap_or(false))
        };

        let proof = self
            .store
            .read(&proof_path)
            .map_err(|err| malformed(Stage::Prove, err))?;
        let public_input = self
            .store
            .read(&public_path)
            .map_err(|err| malformed(Stage::Prove, err))?;
        Ok(CompletedProof {
            session: session_id,
            proof,
            public_input,
            match_found,
        })
    }

    /// Close out a session whose proof has been archived. The archive
    /// holds the blobs now, so every staged artifact is released.
    pub fn mark_submitted(&self, owner: UserId) -> Result<(), PipelineError> {
        let mut sessions = self.sessions.write();
        let session = sessions.get_mut(&owner).ok_or_else(|| no_session(Stage::Prove))?;
        if session.state != SessionState::ProofReady {
            return Err(PipelineError::PreconditionNotMet {
                stage: Stage::Prove,
                reason: format!(
                    "only a PROOF_READY session can be submitted (session is at {})",
                    session.state.as_str()
                ),
            });
        }
        session.advance(SessionState::Submitted, None);
        for path in session.artifacts() {
            self.store.release(&path);
        }
        info!(session = %session.id, "session submitted");
        Ok(())
    }

    /// Validate preconditions for `stage` and flag the session busy. The
    /// returned guard clears the flag even if the caller never reaches
    /// [`Self::finish_stage`].
    fn begin_stage(
        &self,
        owner: UserId,
        stage: Stage,
        inputs: &[&Path],
    ) -> Result<BusyGuard<'_>, PipelineError> {
        let mut sessions = self.sessions.write();
        let session = sessions.get_mut(&owner).ok_or_else(|| no_session(stage))?;
        if session.busy {
            return Err(PipelineError::StageInFlight);
        }
        if !stage.permitted_from(session.state) {
            return Err(PipelineError::PreconditionNotMet {
                stage,
                reason: format!(
                    "stage cannot run from state {}",
                    session.state.as_str()
                ),
            });
        }
        for input in inputs {
            if !session.owns_artifact(input) {
                return Err(PipelineError::PreconditionNotMet {
                    stage,
                    reason: "artifact does not belong to this session".to_owned(),
                });
            }
            self.store
                .require(input)
                .map_err(|err| precondition(stage, err))?;
        }
        session.busy = true;
        Ok(BusyGuard {
            sessions: &self.sessions,
            owner,
            armed: true,
        })
    }

    /// Clear the busy flag, validate the stage output, and advance. A
    /// failed stage releases the never-produced output path.
    fn finish_stage(
        &self,
        guard: BusyGuard<'_>,
        stage: Stage,
        result: Result<(), PipelineError>,
        output: &Path,
        record: impl FnOnce(&mut Session),
    ) -> Result<(), PipelineError> {
        let mut sessions = self.sessions.write();
        let session = sessions
            .get_mut(&guard.owner)
            .ok_or(PipelineError::WorkersUnavailable)?;
        session.busy = false;
        guard.disarm();
        let outcome = (|| {
            result?;
            self.require_output(stage, output)
        })();
        if let Err(err) = outcome {
            self.store.release(output);
            return Err(err);
        }
        record(session);
        session.advance(stage.produces(), Some(stage));
        Ok(())
    }

    /// Run the executor under a global process slot.
    async fn run_stage(
        &self,
        stage: Stage,
        inputs: Vec<PathBuf>,
        outputs: Vec<PathBuf>,
    ) -> Result<(), PipelineError> {
        let _permit = self
            .process_slots
            .acquire()
            .await
            .map_err(|_| PipelineError::WorkersUnavailable)?;
        let invocation = StageInvocation {
            stage,
            inputs,
            outputs,
        };
        match self.executor.execute(&invocation).await {
            Ok(_) => Ok(()),
            Err(err) => {
                warn!(stage = stage.as_str(), error = %err, "stage failed");
                Err(err)
            }
        }
    }

    fn require_output(&self, stage: Stage, output: &Path) -> Result<(), PipelineError> {
        self.store
            .require(output)
            .map_err(|err| malformed(stage, err))
    }
}

/// Decode the match flag from public-input JSON: an array of decimal
/// strings whose first element is `"1"` on a biometric match.
fn decode_match_flag(bytes: &[u8]) -> Result<bool, PipelineError> {
    let signals: Vec<String> =
        serde_json::from_slice(bytes).map_err(|err| PipelineError::MalformedArtifact {
            stage: Stage::Prove,
            reason: format!("public input is not a JSON string array: {err}"),
        })?;
    match signals.first() {
        Some(flag) => Ok(flag == "1"),
        None => Err(PipelineError::MalformedArtifact {
            stage: Stage::Prove,
            reason: "public input array is empty".to_owned(),
        }),
    }
}

fn no_session(stage: Stage) -> PipelineError {
    PipelineError::PreconditionNotMet {
        stage,
        reason: "no active session; upload a fingerprint to begin".to_owned(),
    }
}

fn precondition(stage: Stage, err: ArtifactError) -> PipelineError {
    PipelineError::PreconditionNotMet {
        stage,
        reason: err.to_string(),
    }
}

fn malformed(stage: Stage, err: ArtifactError) -> PipelineError {
    PipelineError::MalformedArtifact {
        stage,
        reason: err.to_string(),
    }
}

#[cfg(all(test, feature = "scripted"))]
mod tests {
    use super::*;
    use crate::executor::scripted::ScriptedExecutor;
    use std::time::Duration;
    use tempfile::TempDir;

    const TIFF: &[u8] = b"II*\x00not-a-real-scan";

    fn orchestrator(executor: ScriptedExecutor) -> (TempDir, PipelineOrchestrator) {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::open(dir.path()).unwrap();
        let orch = PipelineOrchestrator::new(store, Arc::new(executor), 4);
        (dir, orch)
    }

    async fn run_to_proof_ready(orch: &PipelineOrchestrator, owner: UserId) -> ProveOutput {
        let first = orch.preprocess(owner, TIFF).await.unwrap();
        let second = orch.preprocess(owner, TIFF).await.unwrap();
        assert_eq!(second.vectors_held, 2);
        let ci = orch
            .build_circuit_input(owner, first.feature_vector, second.feature_vector)
            .await
            .unwrap();
        let wtns = orch.generate_witness(owner, ci).await.unwrap();
        orch.generate_proof(owner, wtns).await.unwrap()
    }

    #[tokio::test]
    async fn full_run_reaches_proof_ready_with_match() {
        let (_dir, orch) = orchestrator(ScriptedExecutor::matching());
        let owner = UserId::new();
        let prove = run_to_proof_ready(&orch, owner).await;
        assert!(prove.match_found);
        let session = orch.session(owner).unwrap();
        assert_eq!(session.state, SessionState::ProofReady);
        assert_eq!(session.transition_log.len(), 5);
    }

    #[tokio::test]
    async fn non_matching_signals_decode_to_false() {
        let (_dir, orch) = orchestrator(ScriptedExecutor::non_matching());
        let owner = UserId::new();
        let prove = run_to_proof_ready(&orch, owner).await;
        assert!(!prove.match_found);
    }

    #[tokio::test]
    async fn stages_out_of_order_are_rejected() {
        let (_dir, orch) = orchestrator(ScriptedExecutor::matching());
        let owner = UserId::new();
        let out = orch.preprocess(owner, TIFF).await.unwrap();
        // Witness requires CIRCUIT_INPUT_READY.
        let err = orch
            .generate_witness(owner, out.feature_vector)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::PreconditionNotMet { stage: Stage::Witness, .. }
        ));
    }

    #[tokio::test]
    async fn foreign_paths_are_rejected() {
        let (_dir, orch) = orchestrator(ScriptedExecutor::matching());
        let owner = UserId::new();
        orch.preprocess(owner, TIFF).await.unwrap();
        orch.preprocess(owner, TIFF).await.unwrap();
        let err = orch
            .build_circuit_input(
                owner,
                PathBuf::from("/etc/passwd"),
                PathBuf::from("/etc/shadow"),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::PreconditionNotMet { .. }));
    }

    #[tokio::test]
    async fn another_owners_artifact_is_rejected() {
        let (_dir, orch) = orchestrator(ScriptedExecutor::matching());
        let alice = UserId::new();
        let mallory = UserId::new();
        let a1 = orch.preprocess(alice, TIFF).await.unwrap();
        let a2 = orch.preprocess(alice, TIFF).await.unwrap();
        orch.preprocess(mallory, TIFF).await.unwrap();
        orch.preprocess(mallory, TIFF).await.unwrap();
        let err = orch
            .build_circuit_input(mallory, a1.feature_vector, a2.feature_vector)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::PreconditionNotMet { stage: Stage::CircuitInput, .. }
        ));
    }

    #[tokio::test]
    async fn failed_stage_leaves_state_and_allows_retry() {
        let (_dir, orch) = orchestrator(ScriptedExecutor::failing_at(Stage::Witness));
        let owner = UserId::new();
        let first = orch.preprocess(owner, TIFF).await.unwrap();
        let second = orch.preprocess(owner, TIFF).await.unwrap();
        let ci = orch
            .build_circuit_input(owner, first.feature_vector, second.feature_vector)
            .await
            .unwrap();
        let err = orch.generate_witness(owner, ci.clone()).await.unwrap_err();
        assert!(matches!(err, PipelineError::ExternalProcessFailure { .. }));
        let session = orch.session(owner).unwrap();
        assert_eq!(session.state, SessionState::CircuitInputReady);
        assert!(!session.busy);
        // The same input can be retried (still failing here, but accepted).
        let err = orch.generate_witness(owner, ci).await.unwrap_err();
        assert!(matches!(err, PipelineError::ExternalProcessFailure { .. }));
    }

    #[tokio::test]
    async fn upload_after_proof_ready_starts_session_over() {
        let (_dir, orch) = orchestrator(ScriptedExecutor::matching());
        let owner = UserId::new();
        run_to_proof_ready(&orch, owner).await;
        let old_id = orch.session(owner).unwrap().id;
        let out = orch.preprocess(owner, TIFF).await.unwrap();
        assert_ne!(out.session, old_id);
        assert_eq!(out.vectors_held, 1);
        assert_eq!(orch.session(owner).unwrap().state, SessionState::Preprocessed);
    }

    #[tokio::test]
    async fn submit_requires_proof_ready_then_closes_session() {
        let (_dir, orch) = orchestrator(ScriptedExecutor::matching());
        let owner = UserId::new();
        assert!(orch.completed_proof(owner).is_err());
        run_to_proof_ready(&orch, owner).await;
        let completed = orch.completed_proof(owner).unwrap();
        assert!(completed.match_found);
        let blob: serde_json::Value = serde_json::from_slice(&completed.proof).unwrap();
        assert!(blob.get("pi_a").is_some());
        orch.mark_submitted(owner).unwrap();
        assert_eq!(orch.session(owner).unwrap().state, SessionState::Submitted);
        // A second submit of the same run is rejected.
        assert!(orch.mark_submitted(owner).is_err());
    }

    #[tokio::test]
    async fn abandoned_stage_does_not_wedge_the_session() {
        let (_dir, orch) =
            orchestrator(ScriptedExecutor::matching().delayed(Duration::from_millis(200)));
        let owner = UserId::new();
        // Drop the in-flight future, as a client disconnect does.
        let dropped =
            tokio::time::timeout(Duration::from_millis(20), orch.preprocess(owner, TIFF)).await;
        assert!(dropped.is_err());
        assert!(!orch.session(owner).unwrap().busy);
        // The owner can start over right away.
        let out = orch.preprocess(owner, TIFF).await.unwrap();
        assert_eq!(out.vectors_held, 1);
    }

    #[tokio::test]
    async fn second_stage_for_a_busy_owner_fails_fast() {
        let (_dir, orch) =
            orchestrator(ScriptedExecutor::matching().delayed(Duration::from_millis(100)));
        let owner = UserId::new();
        // join! polls the first call up to its sleep before starting the
        // second, so the second observes the in-flight session.
        let (first, second) =
            tokio::join!(orch.preprocess(owner, TIFF), orch.preprocess(owner, TIFF));
        first.unwrap();
        assert!(matches!(second.unwrap_err(), PipelineError::StageInFlight));
        assert!(!orch.session(owner).unwrap().busy);
    }

    #[tokio::test]
    async fn discarded_and_submitted_artifacts_are_released() {
        let (_dir, orch) = orchestrator(ScriptedExecutor::matching());
        let owner = UserId::new();
        let prove = run_to_proof_ready(&orch, owner).await;

        // Starting over releases the old session's staged files.
        let old_proof = prove.proof.clone();
        orch.preprocess(owner, TIFF).await.unwrap();
        assert!(orch.store().require(&old_proof).is_err());
        assert!(!old_proof.exists());

        // Submission releases the new session's files too.
        let prove = {
            orch.preprocess(owner, TIFF).await.unwrap();
            let session = orch.session(owner).unwrap();
            let ci = orch
                .build_circuit_input(
                    owner,
                    session.feature_vectors[0].clone(),
                    session.feature_vectors[1].clone(),
                )
                .await
                .unwrap();
            let wtns = orch.generate_witness(owner, ci).await.unwrap();
            orch.generate_proof(owner, wtns).await.unwrap()
        };
        orch.completed_proof(owner).unwrap();
        orch.mark_submitted(owner).unwrap();
        assert!(orch.store().require(&prove.proof).is_err());
        assert!(orch.store().require(&prove.public_input).is_err());
    }

    #[tokio::test]
    async fn empty_upload_is_rejected() {
        let (_dir, orch) = orchestrator(ScriptedExecutor::matching());
        let err = orch.preprocess(UserId::new(), b"").await.unwrap_err();
        assert!(matches!(err, PipelineError::PreconditionNotMet { .. }));
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Only a first signal of exactly "1" decodes as a match.
            #[test]
            fn match_flag_is_first_signal_equality(
                first in "[0-9]{1,4}",
                rest in proptest::collection::vec("[0-9]{1,4}", 0..4),
            ) {
                let mut signals = vec![first.clone()];
                signals.extend(rest);
                let bytes = serde_json::to_vec(&signals).unwrap();
                prop_assert_eq!(decode_match_flag(&bytes).unwrap(), first == "1");
            }
        }
    }

    #[test]
    fn match_flag_decoding_is_strict() {
        assert!(decode_match_flag(br#"["1","42"]"#).unwrap());
        assert!(!decode_match_flag(br#"["0","42"]"#).unwrap());
        assert!(!decode_match_flag(br#"["2"]"#).unwrap());
        assert!(decode_match_flag(br#"[]"#).is_err());
        assert!(decode_match_flag(b"not json").is_err());
        assert!(decode_match_flag(br#"{"a":1}"#).is_err());
    }
}
