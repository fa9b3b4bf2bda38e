#![deny(missing_docs)]

//! # zkgate-core — Foundational Types for ZKGate
//!
//! This crate defines the types every other crate in the workspace depends
//! on. It has no internal crate dependencies — only `serde`, `thiserror`,
//! `uuid`, and `utoipa` from the external ecosystem.
//!
//! ## Design Principles
//!
//! 1. **Newtype wrappers for domain primitives.** You cannot pass a
//!    [`UserId`] where a [`SubmissionId`] is expected.
//!
//! 2. **One capability table.** Every authorization decision in the stack
//!    flows through [`Role::allows`]. No per-route role conditionals that
//!    can drift apart.
//!
//! 3. **Structured errors with `thiserror`** — no `Box<dyn Error>`, no
//!    `.unwrap()` outside tests.

pub mod access;
pub mod error;
pub mod identity;

// Re-export primary types at crate root for ergonomic imports.
pub use access::{Capability, Role};
pub use error::ValidationError;
pub use identity::{SessionId, SubmissionId, UserId};
