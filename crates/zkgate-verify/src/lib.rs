//! # zkgate-verify — Verification Service
//!
//! Checks archived Groth16 proofs against the circuit's verification key
//! and classifies the outcome. The classification a reviewer cares about
//! is two-dimensional:
//!
//! - **verified** — the cryptographic check passed.
//! - **tampered** — the *reason* it failed points at corrupted or altered
//!   artifacts (unparseable blobs, checker diagnostics) rather than an
//!   honest non-match, a missing key, or a timeout.
//!
//! Verification is read-only and deterministic: the same blobs and key
//! always produce the same verdict, and nothing about the archived
//! submission is changed here.

#![deny(missing_docs)]

mod checker;
mod verdict;
mod verifier;

pub use checker::{CheckReport, ProofChecker, SnarkjsChecker, SnarkjsConfig, VerifyError};
#[cfg(feature = "scripted")]
pub use checker::scripted::ScriptedChecker;
pub use verdict::Verdict;
pub use verifier::ProofVerifier;
