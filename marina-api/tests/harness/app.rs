#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use marina_api::auth::JwtSecret;
use marina_api::{create_api_router, ApiConfig, AppState, AuthConfig, JwtIdentityVerifier};
use marina_storage::{EntityStore, InMemoryEntityStore};
use marina_test_utils::tokens::{bearer_for, TEST_JWT_SECRET};
use serde_json::Value;
use tower::ServiceExt;

pub const BASE_URL: &str = "http://marina.test";

/// Application config used by every integration test. Links are rooted at
/// `BASE_URL` so assertions do not depend on the Host header.
pub fn test_config(serialize_relationships: bool) -> ApiConfig {
    ApiConfig {
        public_base_url: Some(BASE_URL.to_string()),
        serialize_relationships,
        ..ApiConfig::default()
    }
}

pub fn test_state(store: Arc<dyn EntityStore>, serialize_relationships: bool) -> AppState {
    let auth = AuthConfig {
        jwt_secret: JwtSecret::new(TEST_JWT_SECRET.to_string()).expect("test secret is valid"),
        ..AuthConfig::default()
    };
    let verifier = JwtIdentityVerifier::new(auth).expect("verifier should build");
    AppState::new(store, test_config(serialize_relationships), Arc::new(verifier))
}

/// Router over a fresh in-memory store.
pub fn test_app() -> Router {
    create_api_router(test_state(Arc::new(InMemoryEntityStore::new()), true))
}

pub fn app_with_store(store: Arc<dyn EntityStore>) -> Router {
    create_api_router(test_state(store, true))
}

#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    pub fn id(&self) -> u64 {
        self.body["id"].as_u64().expect("response should carry an id")
    }

    pub fn error(&self) -> &str {
        self.body["Error"].as_str().unwrap_or_default()
    }
}

/// Send one JSON request through the router. `subject` mints a bearer token.
pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    subject: Option<&str>,
    body: Option<Value>,
) -> TestResponse {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::ACCEPT, "application/json");
    if let Some(subject) = subject {
        builder = builder.header(header::AUTHORIZATION, bearer_for(subject));
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("request should build");

    into_test_response(app.clone().oneshot(request).await.expect("router is infallible")).await
}

pub async fn into_test_response(response: axum::response::Response) -> TestResponse {
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should be readable");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    TestResponse {
        status,
        headers,
        body,
    }
}

pub async fn create_boat(app: &Router, owner: &str, body: Value) -> u64 {
    let response = send(app, Method::POST, "/boats", Some(owner), Some(body)).await;
    assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
    response.id()
}

pub async fn create_load(app: &Router, body: Value) -> u64 {
    let response = send(app, Method::POST, "/loads", None, Some(body)).await;
    assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
    response.id()
}
