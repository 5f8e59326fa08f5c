//! Load-related API types.

use marina_core::{BoatId, Load, LoadId, ValidationError};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::links::LinkBuilder;
use crate::services::load_registry::{LoadChanges, LoadInput};

/// Body of `POST /loads`, `PUT /loads/{id}` and `PATCH /loads/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct LoadRequest {
    pub weight: Option<i64>,
    pub content: Option<String>,
    /// `YYYY-MM-DD`.
    pub delivery_date: Option<String>,
}

impl LoadRequest {
    pub fn into_input(self) -> Result<LoadInput, ValidationError> {
        LoadInput::new(self.weight, self.content, self.delivery_date)
    }

    pub fn into_changes(self) -> Result<LoadChanges, ValidationError> {
        let changes = LoadChanges {
            weight: self.weight,
            content: self.content,
            delivery_date: self.delivery_date,
        };
        if changes.is_empty() {
            return Err(ValidationError::EmptyUpdate);
        }
        Ok(changes)
    }
}

/// Load envelope. `current_boat` is `null` while the load is unassigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct LoadResponse {
    pub id: LoadId,
    pub weight: u32,
    pub content: String,
    pub delivery_date: chrono::NaiveDate,
    pub current_boat: Option<BoatId>,
    #[serde(rename = "self")]
    pub self_link: String,
}

impl LoadResponse {
    pub fn new(load: Load, links: &LinkBuilder) -> Self {
        Self {
            self_link: links.entity(load.id),
            id: load.id,
            weight: load.weight,
            content: load.content,
            delivery_date: load.delivery_date,
            current_boat: load.current_boat,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use marina_core::EntityIdType;
    use serde_json::json;

    #[test]
    fn test_unassigned_load_renders_null_boat() {
        let load = Load {
            id: LoadId::new(5),
            weight: 5,
            content: "LEGO Blocks".to_string(),
            delivery_date: NaiveDate::from_ymd_opt(2021, 1, 10).unwrap(),
            current_boat: None,
        };
        let json = serde_json::to_value(LoadResponse::new(load, &LinkBuilder::new("http://h"))).unwrap();
        assert_eq!(json["current_boat"], serde_json::Value::Null);
        assert_eq!(json["delivery_date"], "2021-01-10");
        assert_eq!(json["self"], "http://h/loads/5");
    }

    #[test]
    fn test_current_boat_not_writable() {
        let body = json!({"weight": 5, "content": "x", "delivery_date": "2021-01-10", "current_boat": 1});
        assert!(serde_json::from_value::<LoadRequest>(body).is_err());
    }

    #[test]
    fn test_patch_with_one_field() {
        let req: LoadRequest = serde_json::from_value(json!({"weight": 7})).unwrap();
        let changes = req.into_changes().unwrap();
        assert_eq!(changes.weight, Some(7));
        assert!(changes.content.is_none());
    }
}
