//! Health Check Endpoint
//!
//! `GET /health` reports liveness plus a probe of the document store. No
//! authentication required.

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use marina_storage::EntityStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::state::AppState;

// ============================================================================
// TYPES
// ============================================================================

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub store: ComponentHealth,
    pub version: String,
    pub uptime_seconds: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ComponentHealth {
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// ============================================================================
// HANDLERS
// ============================================================================

/// GET /health - Liveness and store connectivity
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "Store is unreachable", body = HealthResponse),
    ),
)]
pub async fn health(
    State(store): State<Arc<dyn EntityStore>>,
    State(start_time): State<std::time::Instant>,
) -> impl IntoResponse {
    let store_health = match check_store(store.as_ref()).await {
        Ok(latency) => ComponentHealth {
            status: HealthStatus::Healthy,
            latency_ms: Some(latency),
            error: None,
        },
        Err(e) => ComponentHealth {
            status: HealthStatus::Unhealthy,
            latency_ms: None,
            error: Some(e),
        },
    };

    let status = store_health.status;
    let response = HealthResponse {
        status,
        store: store_health,
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: start_time.elapsed().as_secs(),
    };

    let status_code = if status == HealthStatus::Healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(response))
}

async fn check_store(store: &dyn EntityStore) -> Result<u64, String> {
    let start = std::time::Instant::now();
    match store.health_check().await {
        Ok(()) => Ok(start.elapsed().as_millis() as u64),
        Err(e) => {
            tracing::error!(error = %e, "Store health check failed");
            Err("Store check failed".to_string())
        }
    }
}

// ============================================================================
// ROUTER
// ============================================================================

/// Create health check router (no auth required)
pub fn create_router() -> Router<AppState> {
    Router::new().route("/", get(health))
}
