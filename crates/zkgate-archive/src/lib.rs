//! # zkgate-archive — Proof Archive
//!
//! Durable record-keeping for submitted proofs. A submission enters the
//! archive as `pending`, a reviewer moves it to `verified` or `rejected`,
//! and either decision can be re-opened back to `pending`. Proof and
//! public-input blobs are stored alongside the record and digest-checked
//! on every read, so silent corruption of an archived proof cannot go
//! unnoticed.
//!
//! The archive never interprets proofs cryptographically; that is the
//! verification service's job. It validates only the *shape* of incoming
//! blobs, so garbage can be rejected at submission time instead of
//! surfacing later during review.

#![deny(missing_docs)]

mod archive;
mod error;
mod submission;

pub use archive::{ListFilter, ProofArchive};
pub use error::ArchiveError;
pub use submission::{ProofSubmission, SubmissionStatus};
