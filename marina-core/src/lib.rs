//! Marina Core - Entity Types
//!
//! Boats, loads and users, their typed ids, field rules and the domain error
//! taxonomy. No I/O lives here; every other crate depends on this one.

pub mod entities;
pub mod error;
pub mod identity;
pub mod validation;

pub use entities::{Boat, Load, LoadRef, LoadState, User};
pub use error::{MarinaError, MarinaResult, RelationshipError, StorageError, ValidationError};
pub use identity::{BoatId, EntityIdType, EntityKind, IdParseError, LoadId, RawId, UserId};
