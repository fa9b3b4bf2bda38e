//! HTTP middleware: request metrics and per-caller rate limiting.

pub mod metrics;
pub mod rate_limit;
