//! Collection envelopes.
//!
//! Every listing renders `{<collection>: [...], offset, limit, count, next}`.
//! `offset` and `limit` echo the query parameters (`null` when absent),
//! `count` is always `5`, and `next` is always present.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{BoatResponse, LoadResponse, UserResponse};
use crate::services::pagination::Page;

macro_rules! list_response {
    ($name:ident, $field:ident, $item:ty) => {
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
        pub struct $name {
            pub $field: Vec<$item>,
            pub offset: Option<u64>,
            pub limit: Option<u64>,
            pub count: u32,
            pub next: String,
        }

        impl From<Page<$item>> for $name {
            fn from(page: Page<$item>) -> Self {
                Self {
                    $field: page.items,
                    offset: page.offset,
                    limit: page.limit,
                    count: page.count,
                    next: page.next,
                }
            }
        }
    };
}

list_response!(BoatListResponse, boats, BoatResponse);
list_response!(LoadListResponse, loads, LoadResponse);
list_response!(UserListResponse, users, UserResponse);

/// `GET /boats/{id}/loads`: the full load records on one boat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BoatLoadsResponse {
    pub loads: Vec<LoadResponse>,
    #[serde(rename = "self")]
    pub self_link: String,
}
