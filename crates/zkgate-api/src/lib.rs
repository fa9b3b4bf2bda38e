//! # zkgate-api — Axum HTTP Surface for ZKGate
//!
//! ZKGate verifies staff identity from fingerprint biometrics without
//! retaining raw biometric comparisons: two samples run through a staged
//! external toolchain producing a Groth16 proof, the proof is archived for
//! reviewer adjudication, and a stand-alone verification service checks
//! any proof pair against the circuit's verification key.
//!
//! ## API Surface
//!
//! | Prefix / route                          | Module               | Domain            |
//! |-----------------------------------------|----------------------|-------------------|
//! | `/biometric/upload-fingerprint` etc.    | [`routes::pipeline`] | Staged pipeline   |
//! | `/biometric/proof-submissions/*`        | [`routes::archive`]  | Archive review    |
//! | `/biometric/verify-zkp`                 | [`routes::verify`]   | Verification      |
//! | `/biometric/users/*`                    | [`routes::users`]    | User directory    |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → MetricsMiddleware → AuthMiddleware → RateLimitMiddleware → Handler
//! ```
//!
//! ## OpenAPI
//!
//! Auto-generated spec via utoipa derive macros at `/openapi.json`.

pub mod auth;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod state;

use axum::middleware::from_fn;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::auth::AuthConfig;
use crate::middleware::metrics::{ApiMetrics, MetricsSnapshot};
use crate::middleware::rate_limit::{RateLimitConfig, RateLimiter};
use crate::state::AppState;

/// Assemble the full application router with all routes and middleware.
///
/// Health probes (`/health/*`) are mounted outside the auth middleware so
/// they remain accessible without credentials.
pub fn app(state: AppState) -> Router {
    let auth_config = AuthConfig {
        token: state.config.auth_token.clone(),
    };
    let metrics = ApiMetrics::new();
    let limiter = RateLimiter::new(RateLimitConfig::default());

    // Authenticated API routes.
    let api = Router::new()
        .merge(routes::pipeline::router())
        .merge(routes::archive::router())
        .merge(routes::verify::router())
        .merge(routes::users::router())
        .merge(openapi::router())
        .layer(from_fn(middleware::rate_limit::rate_limit_middleware))
        .layer(from_fn(auth::auth_middleware))
        .layer(from_fn(middleware::metrics::metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(axum::Extension(auth_config))
        .layer(axum::Extension(metrics.clone()))
        .layer(axum::Extension(limiter))
        .with_state(state);

    // Unauthenticated health probes. Readiness carries the traffic
    // counters so an operator can watch them without credentials.
    let health = Router::new()
        .route("/health/liveness", axum::routing::get(liveness))
        .route("/health/readiness", axum::routing::get(readiness))
        .layer(axum::Extension(metrics));

    Router::new().merge(health).merge(api)
}

/// Liveness probe — always returns 200 if the process is running.
async fn liveness() -> &'static str {
    "ok"
}

/// Body of the readiness probe.
#[derive(serde::Serialize)]
struct ReadinessReport {
    status: &'static str,
    traffic: MetricsSnapshot,
}

/// Readiness probe — returns 200 with a traffic snapshot while serving.
async fn readiness(
    axum::Extension(metrics): axum::Extension<ApiMetrics>,
) -> axum::Json<ReadinessReport> {
    axum::Json(ReadinessReport {
        status: "ready",
        traffic: metrics.snapshot(),
    })
}
