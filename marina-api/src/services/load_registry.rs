//! Load Registry
//!
//! Owns Load records and their `current_boat` back-reference.

use std::sync::Arc;

use marina_core::validation::{parse_delivery_date, require, validate_content, validate_weight};
use marina_core::{
    BoatId, EntityIdType, EntityKind, Load, LoadId, MarinaError, MarinaResult, ValidationError,
};
use marina_storage::{decode_entity, encode_entity, EntityStore, Filter, Key};

use super::pagination::PageWindow;

const KIND: EntityKind = EntityKind::Load;

// ============================================================================
// INPUTS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadInput {
    pub weight: u32,
    pub content: String,
    pub delivery_date: chrono::NaiveDate,
}

impl LoadInput {
    pub fn new(
        weight: Option<i64>,
        content: Option<String>,
        delivery_date: Option<String>,
    ) -> Result<Self, ValidationError> {
        let weight = require("weight", weight)?;
        let content = require("content", content)?;
        let delivery_date = require("delivery_date", delivery_date)?;

        let weight = validate_weight(weight)?;
        validate_content(&content)?;
        let delivery_date = parse_delivery_date(&delivery_date)?;

        Ok(Self {
            weight,
            content,
            delivery_date,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadChanges {
    pub weight: Option<i64>,
    pub content: Option<String>,
    pub delivery_date: Option<String>,
}

impl LoadChanges {
    pub fn is_empty(&self) -> bool {
        self.weight.is_none() && self.content.is_none() && self.delivery_date.is_none()
    }

    pub fn merge(self, current: &Load) -> Result<LoadInput, ValidationError> {
        LoadInput::new(
            Some(self.weight.unwrap_or(i64::from(current.weight))),
            Some(self.content.unwrap_or_else(|| current.content.clone())),
            Some(self.delivery_date.unwrap_or_else(|| {
                current
                    .delivery_date
                    .format(marina_core::validation::DELIVERY_DATE_FORMAT)
                    .to_string()
            })),
        )
    }
}

// ============================================================================
// REGISTRY
// ============================================================================

#[derive(Clone)]
pub struct LoadRegistry {
    store: Arc<dyn EntityStore>,
}

impl LoadRegistry {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self { store }
    }

    /// Create an unassigned load.
    pub async fn create(&self, input: LoadInput) -> MarinaResult<Load> {
        let mut load = Load {
            id: LoadId::new(0),
            weight: input.weight,
            content: input.content,
            delivery_date: input.delivery_date,
            current_boat: None,
        };
        let raw = self
            .store
            .put(KIND, Key::New, encode_entity(KIND, &load)?)
            .await?;
        load.id = LoadId::new(raw);

        tracing::info!(load_id = %load.id, "Load created");
        Ok(load)
    }

    pub async fn find(&self, id: LoadId) -> MarinaResult<Option<Load>> {
        match self.store.get(KIND, id.as_raw()).await? {
            Some(doc) => Ok(Some(decode_entity(KIND, id.as_raw(), doc)?)),
            None => Ok(None),
        }
    }

    pub async fn get(&self, id: LoadId) -> MarinaResult<Load> {
        self.find(id)
            .await?
            .ok_or_else(|| MarinaError::not_found(KIND, id))
    }

    pub async fn list(&self, window: PageWindow) -> MarinaResult<Vec<Load>> {
        let page = self
            .store
            .scan(KIND, &Filter::all(), window.limit, window.offset)
            .await?;
        page.entries
            .into_iter()
            .map(|(raw, doc)| decode_entity(KIND, raw, doc).map_err(MarinaError::from))
            .collect()
    }

    /// Full overwrite, `current_boat` included.
    pub async fn replace(
        &self,
        id: LoadId,
        input: LoadInput,
        current_boat: Option<BoatId>,
    ) -> MarinaResult<Load> {
        if self.find(id).await?.is_none() {
            return Err(MarinaError::not_found(KIND, id));
        }
        let load = Load {
            id,
            weight: input.weight,
            content: input.content,
            delivery_date: input.delivery_date,
            current_boat,
        };
        self.save(&load).await?;
        Ok(load)
    }

    /// Point the load at `boat` (or clear it), leaving every other field alone.
    pub async fn set_current_boat(&self, id: LoadId, boat: Option<BoatId>) -> MarinaResult<Load> {
        let mut load = self.get(id).await?;
        load.current_boat = boat;
        self.save(&load).await?;
        Ok(load)
    }

    /// Remove the record. Callers clear the boat side first.
    pub async fn delete(&self, id: LoadId) -> MarinaResult<bool> {
        Ok(self.store.delete(KIND, id.as_raw()).await?)
    }

    pub async fn save(&self, load: &Load) -> MarinaResult<()> {
        self.store
            .put(KIND, Key::Id(load.id.as_raw()), encode_entity(KIND, load)?)
            .await?;
        Ok(())
    }
}
