//! Identity types for Marina entities

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Raw store key. Ids are allocated by the store, start at 1 and only grow.
pub type RawId = u64;

/// The three entity kinds persisted by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Boat,
    Load,
    User,
}

impl EntityKind {
    /// All kinds, in key-prefix order.
    pub const ALL: [EntityKind; 3] = [EntityKind::Boat, EntityKind::Load, EntityKind::User];

    /// Singular lowercase name, as used in messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Boat => "boat",
            EntityKind::Load => "load",
            EntityKind::User => "user",
        }
    }

    /// Collection segment used in URLs (`/boats`, `/loads`, `/users`).
    pub fn collection(&self) -> &'static str {
        match self {
            EntityKind::Boat => "boats",
            EntityKind::Load => "loads",
            EntityKind::User => "users",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a textual id cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdParseError {
    pub kind: EntityKind,
    pub input: String,
}

impl fmt::Display for IdParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' is not a valid {} id", self.input, self.kind)
    }
}

impl std::error::Error for IdParseError {}

/// Trait shared by the typed id newtypes.
pub trait EntityIdType:
    Copy + Eq + std::hash::Hash + Ord + fmt::Debug + fmt::Display + Send + Sync + 'static
{
    /// Kind of entity this id addresses.
    const KIND: EntityKind;

    fn new(raw: RawId) -> Self;

    fn as_raw(&self) -> RawId;

    /// Parse a path segment. Anything that is not a positive integer fails.
    fn parse(input: &str) -> Result<Self, IdParseError> {
        match input.parse::<RawId>() {
            Ok(raw) if raw > 0 => Ok(Self::new(raw)),
            _ => Err(IdParseError {
                kind: Self::KIND,
                input: input.to_string(),
            }),
        }
    }
}

macro_rules! define_entity_id {
    ($(#[$meta:meta])* $name:ident, $kind:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
        #[serde(transparent)]
        pub struct $name(RawId);

        impl EntityIdType for $name {
            const KIND: EntityKind = $kind;

            fn new(raw: RawId) -> Self {
                Self(raw)
            }

            fn as_raw(&self) -> RawId {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = IdParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                <Self as EntityIdType>::parse(s)
            }
        }
    };
}

define_entity_id!(
    /// Identifier of a boat.
    BoatId,
    EntityKind::Boat
);
define_entity_id!(
    /// Identifier of a load.
    LoadId,
    EntityKind::Load
);
define_entity_id!(
    /// Identifier of a registered user.
    UserId,
    EntityKind::User
);
