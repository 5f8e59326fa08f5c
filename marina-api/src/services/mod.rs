//! Service Layer
//!
//! Registries own one entity kind each and persist through the shared
//! `EntityStore`. The relationship coordinator is the only component that
//! writes the Boat/Load cross references.

pub mod boat_registry;
pub mod load_registry;
pub mod pagination;
pub mod relationship;
pub mod user_registry;

pub use boat_registry::{BoatChanges, BoatInput, BoatRegistry};
pub use load_registry::{LoadChanges, LoadInput, LoadRegistry};
pub use pagination::{next_link, Page, PageRequest, PageWindow, PAGE_COUNT};
pub use relationship::{
    CleanupReport, RelationshipCoordinator, RelationshipGuard, RelationshipLocks,
};
pub use user_registry::UserRegistry;
