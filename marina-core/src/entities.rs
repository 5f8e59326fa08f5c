//! Entity structures
//!
//! Boat and Load hold the two halves of the 1:M relationship as denormalised
//! fields: `Boat::loads` lists the loads it carries and `Load::current_boat`
//! points back. Keeping both halves in agreement is the job of the
//! relationship coordinator in `marina-api`; nothing here enforces it.

use crate::identity::{BoatId, LoadId, UserId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Entry in a boat's `loads` list. `self` is the load's absolute URL, cached at
/// assignment time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct LoadRef {
    pub id: LoadId,
    #[serde(rename = "self")]
    pub self_link: String,
}

/// A boat owned by an external identity subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Boat {
    pub id: BoatId,
    pub name: String,
    #[serde(rename = "type")]
    pub boat_type: String,
    pub length: u32,
    pub public: bool,
    /// Subject id of the owner.
    pub owner: String,
    /// Ordered by assignment time.
    #[serde(default)]
    pub loads: Vec<LoadRef>,
}

impl Boat {
    pub fn carries(&self, load: LoadId) -> bool {
        self.loads.iter().any(|entry| entry.id == load)
    }

    /// Append a load reference. Returns `false` if the load was already listed.
    pub fn push_load(&mut self, entry: LoadRef) -> bool {
        if self.carries(entry.id) {
            return false;
        }
        self.loads.push(entry);
        true
    }

    /// Remove a load reference. Returns `false` if it was not listed.
    pub fn remove_load(&mut self, load: LoadId) -> bool {
        let before = self.loads.len();
        self.loads.retain(|entry| entry.id != load);
        self.loads.len() != before
    }

    pub fn is_owned_by(&self, subject: &str) -> bool {
        self.owner == subject
    }
}

/// A load that can be carried by at most one boat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Load {
    pub id: LoadId,
    pub weight: u32,
    pub content: String,
    pub delivery_date: NaiveDate,
    #[serde(default)]
    pub current_boat: Option<BoatId>,
}

/// Relationship state of a load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Unassigned,
    Assigned(BoatId),
}

impl Load {
    pub fn state(&self) -> LoadState {
        match self.current_boat {
            Some(boat) => LoadState::Assigned(boat),
            None => LoadState::Unassigned,
        }
    }
}

/// A registered user, keyed by the identity provider's subject id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub uuid: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::EntityIdType;

    fn boat() -> Boat {
        Boat {
            id: BoatId::new(1),
            name: "Orca".to_string(),
            boat_type: "Catamaran".to_string(),
            length: 28,
            public: true,
            owner: "subject-1".to_string(),
            loads: Vec::new(),
        }
    }

    fn entry(id: u64) -> LoadRef {
        LoadRef {
            id: LoadId::new(id),
            self_link: format!("http://localhost/loads/{}", id),
        }
    }

    #[test]
    fn test_push_load_keeps_order_and_rejects_duplicates() {
        let mut boat = boat();
        assert!(boat.push_load(entry(3)));
        assert!(boat.push_load(entry(1)));
        assert!(!boat.push_load(entry(3)));
        let ids: Vec<_> = boat.loads.iter().map(|e| e.id.as_raw()).collect();
        assert_eq!(ids, vec![3, 1]);
    }

    #[test]
    fn test_remove_load() {
        let mut boat = boat();
        boat.push_load(entry(3));
        assert!(boat.remove_load(LoadId::new(3)));
        assert!(!boat.remove_load(LoadId::new(3)));
        assert!(boat.loads.is_empty());
    }

    #[test]
    fn test_boat_serializes_with_wire_names() {
        let mut boat = boat();
        boat.push_load(entry(5));
        let json = serde_json::to_value(&boat).unwrap();
        assert_eq!(json["type"], "Catamaran");
        assert_eq!(json["loads"][0]["id"], 5);
        assert_eq!(json["loads"][0]["self"], "http://localhost/loads/5");
    }

    #[test]
    fn test_load_state() {
        let mut load = Load {
            id: LoadId::new(2),
            weight: 10,
            content: "Legos".to_string(),
            delivery_date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            current_boat: None,
        };
        assert_eq!(load.state(), LoadState::Unassigned);
        load.current_boat = Some(BoatId::new(1));
        assert_eq!(load.state(), LoadState::Assigned(BoatId::new(1)));

        let json = serde_json::to_value(&load).unwrap();
        assert_eq!(json["delivery_date"], "2024-01-02");
        assert_eq!(json["current_boat"], 1);
    }
}
