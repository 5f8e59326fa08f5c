//! Marina API - REST Layer
//!
//! Axum routes for boats, loads and users over a pluggable document store.
//! The relationship coordinator in [`services::relationship`] keeps the
//! Boat/Load cross references consistent; everything else is request
//! decoding, authentication and envelope rendering.

pub mod auth;
pub mod config;
pub mod error;
pub mod extractors;
pub mod macros;
pub mod middleware;
pub mod negotiation;
pub mod openapi;
pub mod routes;
pub mod services;
pub mod state;
pub mod telemetry;
pub mod types;

// Re-export commonly used types
pub use auth::{
    generate_jwt_token, validate_jwt_token, AuthConfig, AuthContext, Claims, IdentityVerifier,
    JwtIdentityVerifier,
};
pub use config::{ApiConfig, StoreConfig};
pub use error::{ApiError, ApiResult, ErrorCode};
pub use middleware::{AuthExtractor, AuthMiddlewareState, MaybeAuth};
pub use openapi::ApiDoc;
pub use routes::create_api_router;
pub use state::AppState;
pub use types::*;
