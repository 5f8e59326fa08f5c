//! Shared application state for Axum routers.

use std::sync::Arc;

use marina_storage::EntityStore;

use crate::auth::IdentityVerifier;
use crate::config::ApiConfig;
use crate::services::{
    BoatRegistry, LoadRegistry, RelationshipCoordinator, RelationshipLocks, UserRegistry,
};

/// Application-wide state shared across all routes.
#[derive(Clone)]
pub struct AppState {
    pub boats: BoatRegistry,
    pub loads: LoadRegistry,
    pub users: UserRegistry,
    /// Sole writer of the Boat/Load cross references.
    pub relationships: RelationshipCoordinator,
    pub store: Arc<dyn EntityStore>,
    pub config: Arc<ApiConfig>,
    pub verifier: Arc<dyn IdentityVerifier>,
    pub start_time: std::time::Instant,
}

impl AppState {
    /// Wire the registries and the coordinator over one store.
    pub fn new(
        store: Arc<dyn EntityStore>,
        config: ApiConfig,
        verifier: Arc<dyn IdentityVerifier>,
    ) -> Self {
        let boats = BoatRegistry::new(store.clone());
        let loads = LoadRegistry::new(store.clone());
        let users = UserRegistry::new(store.clone());
        let locks = Arc::new(RelationshipLocks::new(config.serialize_relationships));
        let relationships = RelationshipCoordinator::new(boats.clone(), loads.clone(), locks);

        Self {
            boats,
            loads,
            users,
            relationships,
            store,
            config: Arc::new(config),
            verifier,
            start_time: std::time::Instant::now(),
        }
    }
}

// Use macro to reduce boilerplate for FromRef implementations
crate::impl_from_ref!(BoatRegistry, boats);
crate::impl_from_ref!(LoadRegistry, loads);
crate::impl_from_ref!(UserRegistry, users);
crate::impl_from_ref!(RelationshipCoordinator, relationships);
crate::impl_from_ref!(Arc<dyn EntityStore>, store);
crate::impl_from_ref!(Arc<ApiConfig>, config);
crate::impl_from_ref!(std::time::Instant, start_time);
