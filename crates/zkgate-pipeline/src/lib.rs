//! # zkgate-pipeline — Staged Verification Pipeline
//!
//! Coordinates the ordered, failure-prone, artifact-producing computations
//! that turn two fingerprint samples into a Groth16 proof:
//!
//! ```text
//! Preprocess ──▶ CircuitInput ──▶ Witness ──▶ Prove
//!   (python)        (python)       (node)     (snarkjs)
//! ```
//!
//! ## Components
//!
//! - [`ArtifactStore`] — staging area that hands out collision-resistant
//!   internal paths and re-validates them before every use. User-supplied
//!   values never become command-line arguments.
//! - [`StageExecutor`] — capability trait over the external toolchain, with
//!   one production implementation ([`ToolchainExecutor`]) and a scripted
//!   test double ([`ScriptedExecutor`], `scripted` feature).
//! - [`PipelineOrchestrator`] — one session per owning identity, strictly
//!   forward state transitions, per-session in-flight guard, and a global
//!   cap on external-process fan-out.
//!
//! A failed stage leaves its session at the last completed state; retries
//! are caller-initiated and write to fresh output paths, so they never
//! corrupt prior artifacts.

pub mod artifact;
pub mod error;
pub mod executor;
pub mod orchestrator;
pub mod session;
pub mod stage;

pub use artifact::{ArtifactError, ArtifactKind, ArtifactStore};
pub use error::PipelineError;
#[cfg(feature = "scripted")]
pub use executor::scripted::ScriptedExecutor;
pub use executor::{StageExecutor, StageInvocation, StageOutcome, ToolchainConfig, ToolchainExecutor};
pub use orchestrator::{CompletedProof, PipelineOrchestrator, PreprocessOutput, ProveOutput};
pub use session::{Session, TransitionRecord};
pub use stage::{SessionState, Stage};
