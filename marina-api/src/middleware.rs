//! Axum Middleware for Authentication
//!
//! `identity_middleware` runs on every resource route. It never rejects a
//! request by itself: listings of public boats are open to anonymous callers.
//! Instead it records the outcome in the request extensions:
//! - a verified `AuthContext` when a valid bearer token was presented,
//! - an `AuthFailure` carrying the reason when a token was presented but
//!   failed verification.
//!
//! Handlers then pick the extractor matching their policy:
//! `AuthExtractor` for routes that require a caller, `MaybeAuth` for routes
//! that behave differently for anonymous callers.

use crate::auth::{bearer_token, AuthContext, IdentityVerifier};
use crate::error::ApiError;
use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

// ============================================================================
// MIDDLEWARE STATE
// ============================================================================

/// Shared state for the identity middleware.
#[derive(Clone)]
pub struct AuthMiddlewareState {
    pub verifier: Arc<dyn IdentityVerifier>,
}

impl AuthMiddlewareState {
    pub fn new(verifier: Arc<dyn IdentityVerifier>) -> Self {
        Self { verifier }
    }
}

/// Why a presented token was not accepted.
#[derive(Debug, Clone)]
pub struct AuthFailure(pub ApiError);

// ============================================================================
// MIDDLEWARE
// ============================================================================

/// Verify the bearer token, if any, and record the result.
pub async fn identity_middleware(
    State(state): State<AuthMiddlewareState>,
    mut request: Request,
    next: Next,
) -> Response {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .map(|h| h.to_str().map(str::to_owned));

    match header {
        None => {}
        Some(Err(_)) => {
            request.extensions_mut().insert(AuthFailure(ApiError::unauthorized(
                "Authorization header is not valid text",
            )));
        }
        Some(Ok(value)) => {
            let outcome = match bearer_token(&value) {
                Ok(token) => state.verifier.verify(token).await,
                Err(e) => Err(e),
            };
            match outcome {
                Ok(ctx) => {
                    tracing::debug!(subject = %ctx.subject, "Bearer token verified");
                    request.extensions_mut().insert(ctx);
                }
                Err(e) => {
                    tracing::debug!(error = %e, "Bearer token rejected");
                    request.extensions_mut().insert(AuthFailure(e));
                }
            }
        }
    }

    next.run(request).await
}

// ============================================================================
// TYPED EXTRACTORS
// ============================================================================

/// Extractor for routes that require an authenticated caller.
///
/// Rejects with 401 and the verification failure reason, or a generic
/// "missing bearer token" message when no token was sent.
#[derive(Debug, Clone)]
pub struct AuthExtractor(pub AuthContext);

#[async_trait]
impl<S> FromRequestParts<S> for AuthExtractor
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(ctx) = parts.extensions.get::<AuthContext>() {
            return Ok(AuthExtractor(ctx.clone()));
        }
        match parts.extensions.get::<AuthFailure>() {
            Some(AuthFailure(err)) => Err(err.clone()),
            None => Err(ApiError::unauthorized("Missing or invalid bearer token")),
        }
    }
}

impl std::ops::Deref for AuthExtractor {
    type Target = AuthContext;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Extractor for routes open to anonymous callers. `None` when no valid
/// token was presented.
#[derive(Debug, Clone)]
pub struct MaybeAuth(pub Option<AuthContext>);

#[async_trait]
impl<S> FromRequestParts<S> for MaybeAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeAuth(parts.extensions.get::<AuthContext>().cloned()))
    }
}

impl MaybeAuth {
    /// Subject of the verified caller, if any.
    pub fn subject(&self) -> Option<&str> {
        self.0.as_ref().map(|ctx| ctx.subject.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{generate_jwt_token, AuthConfig, JwtIdentityVerifier, JwtSecret};
    use axum::{body::Body, http::StatusCode, middleware, routing::get, Router};
    use tower::ServiceExt;

    fn test_auth_config() -> AuthConfig {
        AuthConfig {
            jwt_secret: JwtSecret::new("middleware-test-secret".to_string())
                .expect("test secret should be valid"),
            ..AuthConfig::default()
        }
    }

    fn test_app() -> Router {
        let verifier = JwtIdentityVerifier::new(test_auth_config()).expect("verifier should build");
        let state = AuthMiddlewareState::new(Arc::new(verifier));

        async fn required(AuthExtractor(auth): AuthExtractor) -> String {
            format!("subject={}", auth.subject)
        }

        async fn optional(auth: MaybeAuth) -> String {
            auth.subject().unwrap_or("anonymous").to_string()
        }

        Router::new()
            .route("/required", get(required))
            .route("/optional", get(optional))
            .layer(middleware::from_fn_with_state(state, identity_middleware))
    }

    async fn body_string(response: Response) -> String {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(body.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_required_route_with_valid_token() {
        let token = generate_jwt_token(&test_auth_config(), "abc".to_string()).unwrap();
        let request = Request::builder()
            .uri("/required")
            .header("authorization", format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap();

        let response = test_app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "subject=abc");
    }

    #[tokio::test]
    async fn test_required_route_without_token() {
        let request = Request::builder()
            .uri("/required")
            .body(Body::empty())
            .unwrap();

        let response = test_app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(body_string(response).await.contains("\"Error\""));
    }

    #[tokio::test]
    async fn test_required_route_with_garbage_token() {
        let request = Request::builder()
            .uri("/required")
            .header("authorization", "Bearer not.a.jwt")
            .body(Body::empty())
            .unwrap();

        let response = test_app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_optional_route_treats_bad_token_as_anonymous() {
        let request = Request::builder()
            .uri("/optional")
            .header("authorization", "Basic dXNlcjpwYXNz")
            .body(Body::empty())
            .unwrap();

        let response = test_app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "anonymous");
    }
}
