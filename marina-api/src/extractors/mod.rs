//! Request extractors shared by the route handlers.

pub mod links;
pub mod path_id;

pub use links::RequestLinks;
pub use path_id::{parse_path_id, PathId, PathIds};
