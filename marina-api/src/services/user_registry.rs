//! User Registry
//!
//! One user per identity subject. The uniqueness of `uuid` is checked at
//! registration time, not enforced by the store.

use std::sync::Arc;

use marina_core::{EntityIdType, EntityKind, MarinaError, MarinaResult, User, UserId};
use marina_storage::{decode_entity, encode_entity, EntityStore, Filter, Key};

use super::pagination::PageWindow;

const KIND: EntityKind = EntityKind::User;

#[derive(Clone)]
pub struct UserRegistry {
    store: Arc<dyn EntityStore>,
}

impl UserRegistry {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self { store }
    }

    /// Register `subject`, returning the existing user if it is already known.
    /// The flag is `true` when a new record was created.
    pub async fn register(&self, subject: &str) -> MarinaResult<(User, bool)> {
        if let Some(existing) = self.find_by_subject(subject).await? {
            return Ok((existing, false));
        }

        let mut user = User {
            id: UserId::new(0),
            uuid: subject.to_string(),
        };
        let raw = self
            .store
            .put(KIND, Key::New, encode_entity(KIND, &user)?)
            .await?;
        user.id = UserId::new(raw);

        tracing::info!(user_id = %user.id, "User registered");
        Ok((user, true))
    }

    pub async fn find_by_subject(&self, subject: &str) -> MarinaResult<Option<User>> {
        let page = self
            .store
            .scan(KIND, &Filter::eq("uuid", subject), 1, 0)
            .await?;
        match page.entries.into_iter().next() {
            Some((raw, doc)) => Ok(Some(decode_entity(KIND, raw, doc)?)),
            None => Ok(None),
        }
    }

    pub async fn get(&self, id: UserId) -> MarinaResult<User> {
        match self.store.get(KIND, id.as_raw()).await? {
            Some(doc) => Ok(decode_entity(KIND, id.as_raw(), doc)?),
            None => Err(MarinaError::not_found(KIND, id)),
        }
    }

    pub async fn list(&self, window: PageWindow) -> MarinaResult<Vec<User>> {
        let page = self
            .store
            .scan(KIND, &Filter::all(), window.limit, window.offset)
            .await?;
        page.entries
            .into_iter()
            .map(|(raw, doc)| decode_entity(KIND, raw, doc).map_err(MarinaError::from))
            .collect()
    }
}
