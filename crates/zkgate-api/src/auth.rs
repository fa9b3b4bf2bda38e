//! # Authentication & the Access Gate
//!
//! Bearer-token middleware resolving every request to a [`CallerIdentity`],
//! plus the single authorization check point ([`require_capability`]).
//!
//! ## Token Format
//!
//! ```text
//! Authorization: Bearer {role}:{user_id}:{secret}   — current format
//! Authorization: Bearer {secret}                     — legacy (administrator)
//! x-auth-token: <same value>                         — legacy header alias
//! ```
//!
//! The secret comparison is constant-time. Authorization decisions all go
//! through the capability table in [`zkgate_core::Role::allows`]; roles are
//! deliberately not ordered, so there is no `>=` shortcut here.

use axum::extract::Request;
use axum::http::request::Parts;
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use subtle::ConstantTimeEq;

use zkgate_core::{Capability, Role, UserId};

use crate::error::{AppError, ErrorBody, ErrorDetail};

// ── CallerIdentity ──────────────────────────────────────────────────────────

/// Identity of the authenticated caller, injected into request extensions
/// by the auth middleware and extracted by handlers via `FromRequestParts`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    /// The caller's role.
    pub role: Role,
    /// The caller's directory identity. `None` for legacy tokens, which
    /// carry no identity binding.
    pub user_id: Option<UserId>,
}

impl CallerIdentity {
    /// The identity pipeline sessions are keyed by. Legacy unbound tokens
    /// all share the nil id, so they drive a single shared session.
    pub fn owner_id(&self) -> UserId {
        self.user_id
            .unwrap_or_else(|| UserId::from_uuid(uuid::Uuid::nil()))
    }
}

#[axum::async_trait]
impl<S: Send + Sync> axum::extract::FromRequestParts<S> for CallerIdentity {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CallerIdentity>()
            .cloned()
            .ok_or_else(|| AppError::Unauthorized("no caller identity in request context".into()))
    }
}

/// Check the capability table for this caller.
///
/// The rejection body is uniform across capabilities and resources so a
/// denied caller learns nothing about what exists.
pub fn require_capability(caller: &CallerIdentity, capability: Capability) -> Result<(), AppError> {
    if caller.role.allows(capability) {
        Ok(())
    } else {
        tracing::warn!(
            role = caller.role.as_str(),
            capability = capability.as_str(),
            "capability denied"
        );
        Err(AppError::Forbidden("insufficient permissions".into()))
    }
}

// ── Auth Configuration ──────────────────────────────────────────────────────

/// Auth configuration injected into request extensions.
///
/// Custom `Debug` redacts the token so it cannot leak through logs.
#[derive(Clone)]
pub struct AuthConfig {
    pub token: Option<String>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

// ── Token Validation ────────────────────────────────────────────────────────

/// Constant-time comparison of bearer secrets.
///
/// When lengths differ, a dummy comparison keeps timing independent of
/// where the mismatch occurs.
fn constant_time_token_eq(provided: &str, expected: &str) -> bool {
    let provided = provided.as_bytes();
    let expected = expected.as_bytes();
    if provided.len() != expected.len() {
        let _ = expected.ct_eq(expected);
        return false;
    }
    provided.ct_eq(expected).into()
}

/// Parse a token in format `{role}:{user_id}:{secret}` or `{secret}`
/// (legacy).
///
/// Legacy tokens are treated as `administrator` with no identity binding,
/// matching deployments that predate the role prefix.
pub fn parse_bearer_token(provided: &str, expected_secret: &str) -> Result<CallerIdentity, String> {
    let parts: Vec<&str> = provided.splitn(3, ':').collect();

    match parts.len() {
        1 => {
            if constant_time_token_eq(provided, expected_secret) {
                Ok(CallerIdentity {
                    role: Role::Administrator,
                    user_id: None,
                })
            } else {
                Err("invalid bearer token".into())
            }
        }
        3 => {
            let role_str = parts[0];
            let user_str = parts[1];
            let secret = parts[2];

            if !constant_time_token_eq(secret, expected_secret) {
                return Err("invalid bearer token".into());
            }

            let role = Role::parse(role_str).ok_or_else(|| format!("unknown role: {role_str}"))?;

            let user_id = if user_str.is_empty() {
                None
            } else {
                Some(
                    user_str
                        .parse::<UserId>()
                        .map_err(|e| format!("invalid user_id: {e}"))?,
                )
            };

            Ok(CallerIdentity { role, user_id })
        }
        _ => Err("invalid token format — expected {role}:{user_id}:{secret} or {secret}".into()),
    }
}

// ── Middleware ───────────────────────────────────────────────────────────────

/// Resolve the request's identity assertion and inject [`CallerIdentity`].
///
/// Accepts `Authorization: Bearer <token>` or the legacy `x-auth-token`
/// header carrying the same value. When `AuthConfig.token` is `None`, all
/// requests run as an unbound administrator (auth disabled / development).
pub async fn auth_middleware(mut request: Request, next: Next) -> Response {
    let expected_token = request.extensions().get::<AuthConfig>().cloned();

    let expected = match expected_token {
        Some(AuthConfig {
            token: Some(expected),
        }) => expected,
        _ => {
            request.extensions_mut().insert(CallerIdentity {
                role: Role::Administrator,
                user_id: None,
            });
            return next.run(request).await;
        }
    };

    let bearer = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    let legacy = request
        .headers()
        .get("x-auth-token")
        .and_then(|v| v.to_str().ok());

    let provided = match (bearer, legacy) {
        (Some(value), _) => match value.strip_prefix("Bearer ") {
            Some(token) => token,
            None => {
                tracing::warn!("authentication failed: non-Bearer authorization scheme");
                return unauthorized_response("authorization header must use Bearer scheme");
            }
        },
        (None, Some(token)) => token,
        (None, None) => {
            tracing::warn!("authentication failed: missing authorization header");
            return unauthorized_response("missing authorization header");
        }
    };

    match parse_bearer_token(provided, &expected) {
        Ok(identity) => {
            request.extensions_mut().insert(identity);
            next.run(request).await
        }
        Err(msg) => {
            tracing::warn!(reason = %msg, "authentication failed: invalid bearer token");
            unauthorized_response(&msg)
        }
    }
}

fn unauthorized_response(message: &str) -> Response {
    let body = ErrorBody {
        error: ErrorDetail {
            code: "UNAUTHORIZED".to_string(),
            message: message.to_string(),
            details: None,
        },
    };
    (StatusCode::UNAUTHORIZED, Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::middleware::from_fn;
    use axum::routing::get;
    use axum::Router;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn test_app(token: Option<String>) -> Router {
        let auth_config = AuthConfig { token };
        Router::new()
            .route("/test", get(|| async { "ok" }))
            .layer(from_fn(auth_middleware))
            .layer(axum::Extension(auth_config))
    }

    // ── Middleware ────────────────────────────────────────────────

    #[tokio::test]
    async fn valid_bearer_token_accepted() {
        let app = test_app(Some("my-secret".to_string()));
        let request = Request::builder()
            .uri("/test")
            .header("Authorization", "Bearer my-secret")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn x_auth_token_alias_accepted() {
        let app = test_app(Some("my-secret".to_string()));
        let request = Request::builder()
            .uri("/test")
            .header("x-auth-token", "reviewer::my-secret")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn missing_authorization_header_rejected() {
        let app = test_app(Some("my-secret".to_string()));
        let request = Request::builder().uri("/test").body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let err: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(err["error"]["code"], "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn invalid_token_rejected() {
        let app = test_app(Some("my-secret".to_string()));
        let request = Request::builder()
            .uri("/test")
            .header("Authorization", "Bearer wrong-token")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn non_bearer_scheme_rejected() {
        let app = test_app(Some("my-secret".to_string()));
        let request = Request::builder()
            .uri("/test")
            .header("Authorization", "Basic dXNlcjpwYXNz")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn auth_disabled_allows_all_requests() {
        let app = test_app(None);
        let request = Request::builder().uri("/test").body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn unknown_role_rejected() {
        let app = test_app(Some("my-secret".to_string()));
        let request = Request::builder()
            .uri("/test")
            .header("Authorization", "Bearer superuser::my-secret")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    // ── Token parsing ─────────────────────────────────────────────

    #[test]
    fn legacy_token_is_unbound_administrator() {
        let identity = parse_bearer_token("my-secret", "my-secret").unwrap();
        assert_eq!(identity.role, Role::Administrator);
        assert!(identity.user_id.is_none());
    }

    #[test]
    fn role_tokens_parse_each_role() {
        for (prefix, role) in [
            ("administrator", Role::Administrator),
            ("subject", Role::Subject),
            ("reviewer", Role::Reviewer),
        ] {
            let token = format!("{prefix}::my-secret");
            let identity = parse_bearer_token(&token, "my-secret").unwrap();
            assert_eq!(identity.role, role);
            assert!(identity.user_id.is_none());
        }
    }

    #[test]
    fn identity_bound_token_carries_user_id() {
        let identity = parse_bearer_token(
            "subject:550e8400-e29b-41d4-a716-446655440000:my-secret",
            "my-secret",
        )
        .unwrap();
        assert_eq!(identity.role, Role::Subject);
        assert_eq!(
            identity.user_id.unwrap().to_string(),
            "550e8400-e29b-41d4-a716-446655440000"
        );
    }

    #[test]
    fn wrong_secret_rejected_in_both_formats() {
        assert!(parse_bearer_token("wrong", "my-secret").is_err());
        assert!(parse_bearer_token("subject::wrong", "my-secret").is_err());
    }

    #[test]
    fn malformed_user_id_rejected() {
        let result = parse_bearer_token("subject:not-a-uuid:my-secret", "my-secret");
        assert!(result.unwrap_err().contains("invalid user_id"));
    }

    #[test]
    fn two_part_token_rejected() {
        assert!(parse_bearer_token("subject:my-secret", "my-secret").is_err());
    }

    #[test]
    fn constant_time_eq_rejects_prefix_and_empty() {
        assert!(constant_time_token_eq("secret-token", "secret-token"));
        assert!(!constant_time_token_eq("secret", "secret-token"));
        assert!(!constant_time_token_eq("", "secret-token"));
    }

    // ── Capability gate ───────────────────────────────────────────

    #[test]
    fn capability_gate_follows_the_table() {
        let reviewer = CallerIdentity {
            role: Role::Reviewer,
            user_id: None,
        };
        assert!(require_capability(&reviewer, Capability::ReviewArchive).is_ok());
        assert!(require_capability(&reviewer, Capability::RunPipeline).is_err());

        let subject = CallerIdentity {
            role: Role::Subject,
            user_id: Some(UserId::new()),
        };
        assert!(require_capability(&subject, Capability::RunPipeline).is_ok());
        assert!(require_capability(&subject, Capability::SetSubmissionStatus).is_err());
        assert!(require_capability(&subject, Capability::ManageUsers).is_err());
    }

    #[test]
    fn forbidden_body_is_uniform() {
        let subject = CallerIdentity {
            role: Role::Subject,
            user_id: None,
        };
        let a = require_capability(&subject, Capability::ReviewArchive).unwrap_err();
        let b = require_capability(&subject, Capability::ManageUsers).unwrap_err();
        assert_eq!(a.to_string(), b.to_string());
    }
}
