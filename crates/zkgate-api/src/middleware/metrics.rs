//! # Request Counters
//!
//! Per-process traffic counters, split along the service's domains so
//! operators can see pipeline activity separately from verification
//! checks. The readiness probe reports a snapshot.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use serde::Serialize;

/// Shared counter state, cloned into the middleware and the readiness
/// probe.
#[derive(Debug, Clone, Default)]
pub struct ApiMetrics {
    inner: Arc<Counters>,
}

#[derive(Debug, Default)]
struct Counters {
    requests: AtomicU64,
    rejected: AtomicU64,
    failed: AtomicU64,
    stage_runs: AtomicU64,
    verifications: AtomicU64,
}

/// Point-in-time counter values, serialized into the readiness body.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    /// Requests that reached the authenticated API.
    pub requests: u64,
    /// Responses with a 4xx status.
    pub rejected: u64,
    /// Responses with a 5xx status.
    pub failed: u64,
    /// Requests that drove a pipeline stage.
    pub stage_runs: u64,
    /// Requests that ran a stand-alone proof check.
    pub verifications: u64,
}

impl ApiMetrics {
    /// Fresh counters, all zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read every counter at once.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            requests: self.inner.requests.load(Ordering::Relaxed),
            rejected: self.inner.rejected.load(Ordering::Relaxed),
            failed: self.inner.failed.load(Ordering::Relaxed),
            stage_runs: self.inner.stage_runs.load(Ordering::Relaxed),
            verifications: self.inner.verifications.load(Ordering::Relaxed),
        }
    }

    fn record(&self, path: &str, status: axum::http::StatusCode) {
        self.inner.requests.fetch_add(1, Ordering::Relaxed);
        if is_stage_path(path) {
            self.inner.stage_runs.fetch_add(1, Ordering::Relaxed);
        } else if path == "/biometric/verify-zkp" {
            self.inner.verifications.fetch_add(1, Ordering::Relaxed);
        }
        if status.is_client_error() {
            self.inner.rejected.fetch_add(1, Ordering::Relaxed);
        } else if status.is_server_error() {
            self.inner.failed.fetch_add(1, Ordering::Relaxed);
        }
    }
}

/// Whether `path` is one of the staged pipeline routes.
fn is_stage_path(path: &str) -> bool {
    path == "/biometric/upload-fingerprint" || path.starts_with("/biometric/generate-")
}

/// Middleware that classifies and counts each request by outcome.
pub async fn metrics_middleware(request: Request, next: Next) -> Response {
    let metrics = request.extensions().get::<ApiMetrics>().cloned();
    let path = request.uri().path().to_owned();

    let response = next.run(request).await;

    if let Some(metrics) = metrics {
        metrics.record(&path, response.status());
    }

    response
}
