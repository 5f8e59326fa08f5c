//! Marina API Server Entry Point
//!
//! Bootstraps configuration, opens the document store, and starts the Axum
//! HTTP server.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use marina_api::{
    create_api_router, ApiConfig, ApiError, ApiResult, AppState, AuthConfig, JwtIdentityVerifier,
    StoreConfig,
};
use marina_storage::{EntityStore, InMemoryEntityStore, LmdbEntityStore};

use marina_api::telemetry::{init_tracing, TelemetryConfig};

#[tokio::main]
async fn main() -> ApiResult<()> {
    let telemetry_config = TelemetryConfig::from_env();
    init_tracing(&telemetry_config)?;

    let api_config = ApiConfig::from_env();
    let auth_config = AuthConfig::from_env();
    auth_config.validate_for_production()?;

    let store = open_store(&StoreConfig::from_env())?;
    let verifier = Arc::new(JwtIdentityVerifier::new(auth_config)?);

    tracing::info!(
        serialize_relationships = api_config.serialize_relationships,
        page_size_max = api_config.page_size_max,
        "Configuration loaded"
    );

    let state = AppState::new(store, api_config, verifier);
    let app: Router = create_api_router(state);

    let addr = resolve_bind_addr()?;
    tracing::info!(%addr, "Starting Marina API server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to bind {}: {}", addr, e)))?;

    let server = axum::serve(listener, app);
    tokio::select! {
        result = server => {
            result.map_err(|e| ApiError::internal_error(format!("Server error: {}", e)))?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    Ok(())
}

fn open_store(config: &StoreConfig) -> ApiResult<Arc<dyn EntityStore>> {
    match &config.path {
        Some(path) => {
            let store = LmdbEntityStore::open(path, config.max_size_mb).map_err(|e| {
                ApiError::internal_error(format!(
                    "Failed to open LMDB store at {}: {}",
                    path.display(),
                    e
                ))
            })?;
            tracing::info!(path = %path.display(), "Using LMDB store");
            Ok(Arc::new(store))
        }
        None => {
            tracing::warn!("MARINA_STORE_PATH not set; data lives in memory only");
            Ok(Arc::new(InMemoryEntityStore::new()))
        }
    }
}

fn resolve_bind_addr() -> ApiResult<SocketAddr> {
    let host = std::env::var("MARINA_API_BIND").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port_str = std::env::var("PORT")
        .ok()
        .or_else(|| std::env::var("MARINA_API_PORT").ok())
        .unwrap_or_else(|| "8080".to_string());
    let port = port_str.parse::<u16>().map_err(|_| {
        ApiError::internal_error(format!("Invalid port value: {}", port_str))
    })?;

    let addr = format!("{}:{}", host, port);
    addr.parse::<SocketAddr>().map_err(|e| {
        ApiError::internal_error(format!("Invalid bind address {}: {}", addr, e))
    })
}
