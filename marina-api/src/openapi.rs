//! OpenAPI Specification for the Marina API
//!
//! Generated by utoipa from the request/response types and the route
//! annotations. Served at `/openapi.json`.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use marina_core::{BoatId, LoadId, LoadRef, UserId};

use crate::error::ErrorBody;
use crate::routes::health::{ComponentHealth, HealthResponse, HealthStatus};
use crate::types::*;

// Import route modules for path references
use crate::routes::{boat, health, load, user};

/// OpenAPI document for the Marina API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Marina API",
        version = "0.1.0",
        description = "Boats, loads and users, with loads assigned to boats",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT"),
    ),
    servers(
        (url = "http://localhost:8080", description = "Local Development")
    ),
    tags(
        (name = "Boats", description = "Boats owned by authenticated users, and the loads they carry"),
        (name = "Loads", description = "Cargo that can be put on at most one boat"),
        (name = "Users", description = "Registered identity subjects"),
        (name = "Health", description = "Service and store health"),
        (name = "Observability", description = "Prometheus metrics"),
    ),
    paths(
        // Boats
        boat::list_boats,
        boat::create_boat,
        boat::get_boat,
        boat::replace_boat,
        boat::update_boat,
        boat::delete_boat,
        boat::list_boat_loads,
        boat::assign_load,
        boat::unassign_load,
        // Loads
        load::list_loads,
        load::create_load,
        load::get_load,
        load::replace_load,
        load::update_load,
        load::delete_load,
        // Users
        user::list_users,
        user::register_user,
        user::get_user,
        // Health & metrics
        health::health,
        crate::telemetry::metrics::metrics_handler,
    ),
    components(schemas(
        BoatId,
        LoadId,
        UserId,
        LoadRef,
        BoatRequest,
        BoatResponse,
        BoatListResponse,
        BoatLoadsResponse,
        LoadRequest,
        LoadResponse,
        LoadListResponse,
        UserResponse,
        UserListResponse,
        ErrorBody,
        HealthResponse,
        HealthStatus,
        ComponentHealth,
    )),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Security scheme modifier for OpenAPI document.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Identity provider ID token"))
                        .build(),
                ),
            );
        }
    }
}

impl ApiDoc {
    /// Generate OpenAPI spec as JSON string.
    pub fn to_json() -> Result<String, serde_json::Error> {
        let openapi = Self::openapi();
        serde_json::to_string_pretty(&openapi)
    }
}
