//! REST API Routes Module
//!
//! Route handlers organized by entity type, plus the router assembly:
//! - Boats, loads and users under `/boats`, `/loads`, `/users`
//! - Health check at `/health`, metrics at `/metrics`
//! - OpenAPI document at `/openapi.json`
//! - CORS support for browser-based clients

pub mod boat;
pub mod health;
pub mod load;
pub mod user;

use std::time::Duration;

use axum::{
    http::{header, HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use utoipa::OpenApi;

use crate::config::ApiConfig;
use crate::error::{ApiError, ErrorCode};
use crate::middleware::{identity_middleware, AuthMiddlewareState};
use crate::negotiation::require_json_accept;
use crate::openapi::ApiDoc;
use crate::state::AppState;
use crate::telemetry::{metrics_handler, observability_middleware};

// Re-export route creation functions for convenience
pub use boat::create_router as boat_router;
pub use health::create_router as health_router;
pub use load::create_router as load_router;
pub use user::create_router as user_router;

// ============================================================================
// SHARED HANDLERS
// ============================================================================

/// PUT, PATCH and DELETE on a collection root.
pub async fn collection_method_not_allowed() -> Response {
    let mut response = ApiError::method_not_allowed().into_response();
    response
        .headers_mut()
        .insert(header::ALLOW, HeaderValue::from_static("GET, POST"));
    response
}

async fn not_found_fallback() -> ApiError {
    ApiError::from_code(ErrorCode::EntityNotFound)
}

/// Handler for /openapi.json endpoint.
async fn openapi_json() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}

// ============================================================================
// CORS LAYER
// ============================================================================

/// Build the CORS layer from ApiConfig.
///
/// In development mode (empty origins), allows all origins.
/// In production mode, only allows configured origins, including
/// `*.example.com` wildcard entries.
fn build_cors_layer(config: &ApiConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::LOCATION])
        .max_age(Duration::from_secs(config.cors_max_age_secs));

    if !config.is_production() {
        tracing::info!("CORS: Development mode - allowing all origins");
        cors.allow_origin(Any)
    } else {
        tracing::info!(
            "CORS: Production mode - allowing origins: {:?}",
            config.cors_origins
        );
        let config = config.clone();
        cors.allow_origin(AllowOrigin::predicate(move |origin: &HeaderValue, _| {
            origin
                .to_str()
                .map(|o| config.is_origin_allowed(o))
                .unwrap_or(false)
        }))
    }
}

// ============================================================================
// ROUTER
// ============================================================================

/// Create the complete API router.
///
/// # Middleware Order (outer to inner)
/// 1. CORS - handles preflight requests
/// 2. Observability - tracing and metrics
/// 3. Identity (resource routes only) - verifies bearer tokens, never rejects
/// 4. Accept negotiation (resource routes only) - 406 for non-JSON clients
pub fn create_api_router(state: AppState) -> Router {
    let auth_state = AuthMiddlewareState::new(state.verifier.clone());
    let cors = build_cors_layer(&state.config);

    let resources = Router::new()
        .nest("/boats", boat::create_router())
        .nest("/loads", load::create_router())
        .nest("/users", user::create_router())
        .layer(from_fn(require_json_accept))
        .layer(from_fn_with_state(auth_state, identity_middleware));

    #[allow(unused_mut)]
    let mut router = Router::new()
        .merge(resources)
        .nest("/health", health::create_router())
        .route("/metrics", get(metrics_handler))
        .route("/openapi.json", get(openapi_json))
        .fallback(not_found_fallback);

    #[cfg(feature = "swagger-ui")]
    {
        use utoipa_swagger_ui::SwaggerUi;
        router = router.merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));
    }

    router.with_state(state).layer(
        ServiceBuilder::new()
            .layer(cors)
            .layer(from_fn(observability_middleware)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cors_dev_mode_builds() {
        let _ = build_cors_layer(&ApiConfig::default());
    }

    #[test]
    fn test_cors_production_builds() {
        let config = ApiConfig {
            cors_origins: vec!["https://marina.example.com".to_string()],
            ..ApiConfig::default()
        };
        let _ = build_cors_layer(&config);
    }

    #[tokio::test]
    async fn test_cors_wildcard_origin() {
        use axum::{body::Body, http::Request};
        use tower::ServiceExt;

        let config = ApiConfig {
            cors_origins: vec!["*.example.com".to_string()],
            ..ApiConfig::default()
        };
        let app: Router = Router::new()
            .route("/", get(|| async { "ok" }))
            .layer(build_cors_layer(&config));

        let request = Request::builder()
            .uri("/")
            .header(header::ORIGIN, "https://app.example.com")
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "https://app.example.com"
        );

        let request = Request::builder()
            .uri("/")
            .header(header::ORIGIN, "https://evil.com")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert!(response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .is_none());
    }

    #[tokio::test]
    async fn test_collection_method_not_allowed_sets_allow() {
        let response = collection_method_not_allowed().await;
        assert_eq!(response.status(), axum::http::StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()[header::ALLOW], "GET, POST");
    }
}
