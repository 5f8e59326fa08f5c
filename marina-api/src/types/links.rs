//! Absolute URL construction.
//!
//! Every item envelope carries a `self` URL and every listing a `next` URL.
//! Both are absolute, rooted at the base the request was served under.

use marina_core::{BoatId, EntityIdType, EntityKind};

/// Builds absolute URLs under one base (`scheme://host[:port]`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkBuilder {
    base: String,
}

impl LinkBuilder {
    pub fn new(base: impl Into<String>) -> Self {
        let base = base.into();
        Self {
            base: base.trim_end_matches('/').to_string(),
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    /// `<base>/boats`, `<base>/loads`, `<base>/users`.
    pub fn collection(&self, kind: EntityKind) -> String {
        format!("{}/{}", self.base, kind.collection())
    }

    /// Self URL of a single entity.
    pub fn entity<T: EntityIdType>(&self, id: T) -> String {
        format!("{}/{}", self.collection(T::KIND), id)
    }

    /// `<base>/boats/<id>/loads`.
    pub fn boat_loads(&self, boat: BoatId) -> String {
        format!("{}/loads", self.entity(boat))
    }
}
