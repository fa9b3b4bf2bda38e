//! Route modules for the `/biometric/*` API surface.

pub mod archive;
pub mod pipeline;
pub mod users;
pub mod verify;
