//! API Request and Response Types
//!
//! Request bodies are decoded into typed structs that reject unknown
//! attributes; responses are the item and collection envelopes.

pub mod links;
pub use links::LinkBuilder;

// Boat types
mod boat;
pub use boat::*;

// Load types
mod load;
pub use load::*;

// User types
mod user;
pub use user::*;

// Collection envelopes
mod list;
pub use list::*;
