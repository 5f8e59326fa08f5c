//! Boat Registry
//!
//! Owns Boat records. The embedded `loads` list is only ever changed by the
//! relationship coordinator; `replace` writes whatever list the caller hands
//! it and never infers membership changes.

use std::sync::Arc;

use marina_core::validation::{require, validate_boat_length, validate_label};
use marina_core::{
    Boat, BoatId, EntityIdType, EntityKind, LoadRef, MarinaError, MarinaResult, ValidationError,
};
use marina_storage::{decode_entity, encode_entity, EntityStore, Filter, Key};

use super::pagination::PageWindow;
use super::relationship::{CleanupReport, RelationshipCoordinator};

const KIND: EntityKind = EntityKind::Boat;

// ============================================================================
// INPUTS
// ============================================================================

/// A fully validated set of boat attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoatInput {
    pub name: String,
    pub boat_type: String,
    pub length: u32,
    pub public: bool,
}

impl BoatInput {
    pub fn new(
        name: Option<String>,
        boat_type: Option<String>,
        length: Option<i64>,
        public: Option<bool>,
    ) -> Result<Self, ValidationError> {
        let name = require("name", name)?;
        let boat_type = require("type", boat_type)?;
        let length = require("length", length)?;
        let public = require("public", public)?;

        validate_label("name", &name)?;
        validate_label("type", &boat_type)?;
        let length = validate_boat_length(length)?;

        Ok(Self {
            name,
            boat_type,
            length,
            public,
        })
    }
}

/// Attributes present in a partial update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoatChanges {
    pub name: Option<String>,
    pub boat_type: Option<String>,
    pub length: Option<i64>,
    pub public: Option<bool>,
}

impl BoatChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.boat_type.is_none()
            && self.length.is_none()
            && self.public.is_none()
    }

    /// Merge onto the stored boat and validate the result.
    pub fn merge(self, current: &Boat) -> Result<BoatInput, ValidationError> {
        BoatInput::new(
            Some(self.name.unwrap_or_else(|| current.name.clone())),
            Some(self.boat_type.unwrap_or_else(|| current.boat_type.clone())),
            Some(self.length.unwrap_or(i64::from(current.length))),
            Some(self.public.unwrap_or(current.public)),
        )
    }
}

// ============================================================================
// REGISTRY
// ============================================================================

#[derive(Clone)]
pub struct BoatRegistry {
    store: Arc<dyn EntityStore>,
}

impl BoatRegistry {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self { store }
    }

    /// Create a boat with no loads. Names are unique across all boats.
    pub async fn create(&self, input: BoatInput, owner: &str) -> MarinaResult<Boat> {
        self.ensure_name_free(&input.name, None).await?;

        let mut boat = Boat {
            id: BoatId::new(0),
            name: input.name,
            boat_type: input.boat_type,
            length: input.length,
            public: input.public,
            owner: owner.to_string(),
            loads: Vec::new(),
        };
        let raw = self
            .store
            .put(KIND, Key::New, encode_entity(KIND, &boat)?)
            .await?;
        boat.id = BoatId::new(raw);

        tracing::info!(boat_id = %boat.id, owner = %boat.owner, "Boat created");
        Ok(boat)
    }

    pub async fn find(&self, id: BoatId) -> MarinaResult<Option<Boat>> {
        match self.store.get(KIND, id.as_raw()).await? {
            Some(doc) => Ok(Some(decode_entity(KIND, id.as_raw(), doc)?)),
            None => Ok(None),
        }
    }

    pub async fn get(&self, id: BoatId) -> MarinaResult<Boat> {
        self.find(id)
            .await?
            .ok_or_else(|| MarinaError::not_found(KIND, id))
    }

    pub async fn list_public(&self, window: PageWindow) -> MarinaResult<Vec<Boat>> {
        self.scan(Filter::eq("public", true), window).await
    }

    pub async fn list_by_owner(&self, owner: &str, window: PageWindow) -> MarinaResult<Vec<Boat>> {
        self.scan(Filter::eq("owner", owner), window).await
    }

    /// Full overwrite. `loads` and `owner` are written exactly as given.
    pub async fn replace(
        &self,
        id: BoatId,
        input: BoatInput,
        loads: Vec<LoadRef>,
        owner: String,
    ) -> MarinaResult<Boat> {
        if self.find(id).await?.is_none() {
            return Err(MarinaError::not_found(KIND, id));
        }
        self.ensure_name_free(&input.name, Some(id)).await?;

        let boat = Boat {
            id,
            name: input.name,
            boat_type: input.boat_type,
            length: input.length,
            public: input.public,
            owner,
            loads,
        };
        self.save(&boat).await?;
        tracing::debug!(boat_id = %id, loads = boat.loads.len(), "Boat replaced");
        Ok(boat)
    }

    /// Delete a boat after releasing every load it carries.
    ///
    /// Release failures do not stop the removal; they are reported back.
    pub async fn delete(
        &self,
        id: BoatId,
        coordinator: &RelationshipCoordinator,
    ) -> MarinaResult<CleanupReport> {
        let guard = coordinator.lock_boat(id).await;

        let boat = self.get(id).await?;
        let report = coordinator.release_boat_loads(&boat).await;
        self.store.delete(KIND, id.as_raw()).await?;
        drop(guard);
        coordinator.forget_boat(id);

        tracing::info!(
            boat_id = %id,
            released = report.released.len(),
            failed = report.failed.len(),
            "Boat deleted"
        );
        Ok(report)
    }

    /// Write a boat back under its own id.
    pub async fn save(&self, boat: &Boat) -> MarinaResult<()> {
        self.store
            .put(KIND, Key::Id(boat.id.as_raw()), encode_entity(KIND, boat)?)
            .await?;
        Ok(())
    }

    async fn scan(&self, filter: Filter, window: PageWindow) -> MarinaResult<Vec<Boat>> {
        let page = self
            .store
            .scan(KIND, &filter, window.limit, window.offset)
            .await?;
        page.entries
            .into_iter()
            .map(|(raw, doc)| decode_entity(KIND, raw, doc).map_err(MarinaError::from))
            .collect()
    }

    /// O(n) in the number of boats sharing the name, which is at most one.
    async fn ensure_name_free(&self, name: &str, except: Option<BoatId>) -> MarinaResult<()> {
        let page = self.store.scan(KIND, &Filter::eq("name", name), 2, 0).await?;
        let taken = page
            .entries
            .iter()
            .any(|(raw, _)| Some(BoatId::new(*raw)) != except);
        if taken {
            return Err(MarinaError::DuplicateName {
                name: name.to_string(),
            });
        }
        Ok(())
    }
}
