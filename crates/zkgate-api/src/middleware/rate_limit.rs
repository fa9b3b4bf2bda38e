//! # Per-Caller Rate Limiting
//!
//! Fixed-window rate limiter keyed by the authenticated caller. Runs
//! after the auth middleware, so the caller identity is already resolved;
//! unauthenticated paths share one bucket.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::Request;
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use parking_lot::RwLock;

use crate::auth::CallerIdentity;
use crate::error::{ErrorBody, ErrorDetail};

/// Rate limiter configuration.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Maximum requests per window.
    pub max_requests: u64,
    /// Window duration in seconds.
    pub window_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 1000,
            window_secs: 60,
        }
    }
}

/// Per-key rate limit state.
#[derive(Debug, Clone)]
struct BucketState {
    count: u64,
    window_start: Instant,
}

/// Shared rate limiter state.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    config: RateLimitConfig,
    buckets: Arc<RwLock<HashMap<String, BucketState>>>,
}

impl RateLimiter {
    /// Create a new rate limiter with the given config.
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            buckets: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Check if a request from the given key should be allowed.
    fn check(&self, key: &str) -> bool {
        let mut buckets = self.buckets.write();
        let now = Instant::now();

        let bucket = buckets.entry(key.to_string()).or_insert(BucketState {
            count: 0,
            window_start: now,
        });

        if now.duration_since(bucket.window_start).as_secs() >= self.config.window_secs {
            bucket.count = 0;
            bucket.window_start = now;
        }

        if bucket.count >= self.config.max_requests {
            false
        } else {
            bucket.count += 1;
            true
        }
    }
}

/// Middleware that enforces per-caller rate limits.
///
/// The key is the caller's user id when the token carries one, else the
/// caller's role, else `"anonymous"`.
pub async fn rate_limit_middleware(request: Request, next: Next) -> Response {
    let limiter = request.extensions().get::<RateLimiter>().cloned();

    if let Some(limiter) = limiter {
        let key = match request.extensions().get::<CallerIdentity>() {
            Some(caller) => caller
                .user_id
                .map(|id| id.to_string())
                .unwrap_or_else(|| caller.role.as_str().to_string()),
            None => "anonymous".to_string(),
        };

        if !limiter.check(&key) {
            let body = ErrorBody {
                error: ErrorDetail {
                    code: "RATE_LIMITED".to_string(),
                    message: "rate limit exceeded".to_string(),
                    details: None,
                },
            };
            return (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();
        }
    }

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_limit_is_enforced_per_key() {
        let limiter = RateLimiter::new(RateLimitConfig {
            max_requests: 2,
            window_secs: 60,
        });
        assert!(limiter.check("a"));
        assert!(limiter.check("a"));
        assert!(!limiter.check("a"));
        // A different key has its own bucket.
        assert!(limiter.check("b"));
    }
}
