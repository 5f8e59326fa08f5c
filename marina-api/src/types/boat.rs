//! Boat-related API types.

use marina_core::{Boat, BoatId, LoadRef, ValidationError};
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;

use super::links::LinkBuilder;
use crate::services::boat_registry::{BoatChanges, BoatInput};

/// Body of `POST /boats`, `PUT /boats/{id}` and `PATCH /boats/{id}`.
///
/// Every attribute is optional at the decoding stage so that missing ones are
/// reported by name; create and replace then require all of them.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct BoatRequest {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub boat_type: Option<String>,
    pub length: Option<i64>,
    /// JSON boolean or the strings `"true"` / `"false"`.
    #[serde(default, deserialize_with = "deserialize_flag")]
    #[schema(value_type = Option<bool>)]
    pub public: Option<bool>,
}

impl BoatRequest {
    /// Validate as a full boat (create / replace).
    pub fn into_input(self) -> Result<BoatInput, ValidationError> {
        BoatInput::new(self.name, self.boat_type, self.length, self.public)
    }

    /// Validate as a partial update.
    pub fn into_changes(self) -> Result<BoatChanges, ValidationError> {
        let changes = BoatChanges {
            name: self.name,
            boat_type: self.boat_type,
            length: self.length,
            public: self.public,
        };
        if changes.is_empty() {
            return Err(ValidationError::EmptyUpdate);
        }
        Ok(changes)
    }
}

fn deserialize_flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
    }

    match Option::<Flag>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Flag::Bool(value)) => Ok(Some(value)),
        Some(Flag::Text(text)) => marina_core::validation::parse_flag("public", &text)
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

/// Boat envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BoatResponse {
    pub id: BoatId,
    pub name: String,
    #[serde(rename = "type")]
    pub boat_type: String,
    pub length: u32,
    pub public: bool,
    pub owner: String,
    pub loads: Vec<LoadRef>,
    #[serde(rename = "self")]
    pub self_link: String,
}

impl BoatResponse {
    pub fn new(boat: Boat, links: &LinkBuilder) -> Self {
        Self {
            self_link: links.entity(boat.id),
            id: boat.id,
            name: boat.name,
            boat_type: boat.boat_type,
            length: boat.length,
            public: boat.public,
            owner: boat.owner,
            loads: boat.loads,
        }
    }
}
