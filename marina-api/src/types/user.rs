//! User API types.

use marina_core::{User, UserId};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::links::LinkBuilder;

/// User envelope. `uuid` is the identity provider's subject id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: UserId,
    pub uuid: String,
    #[serde(rename = "self")]
    pub self_link: String,
}

impl UserResponse {
    pub fn new(user: User, links: &LinkBuilder) -> Self {
        Self {
            self_link: links.entity(user.id),
            id: user.id,
            uuid: user.uuid,
        }
    }
}
