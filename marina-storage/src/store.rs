//! Async document store trait.
//!
//! Entities are persisted as JSON objects keyed by `(EntityKind, RawId)`. The
//! id is the key and is not repeated inside the document; `encode_entity` and
//! `decode_entity` strip and restore it.
//!
//! There are no multi-key transactions. Callers that write two documents to
//! keep a relationship consistent must tolerate the second write failing.

use ::async_trait::async_trait;
use marina_core::{EntityKind, RawId, StorageError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

/// A stored document: the entity's fields minus its id.
pub type Document = Map<String, Value>;

/// Result type alias for store operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Target of a `put`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// Allocate a fresh id.
    New,
    /// Overwrite (or create) the document at this id.
    Id(RawId),
}

/// Conjunction of `field == value` predicates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    predicates: Vec<(String, Value)>,
}

impl Filter {
    /// Filter that matches every document.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::all().and_eq(field, value)
    }

    pub fn and_eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.predicates.push((field.into(), value.into()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    pub fn matches(&self, doc: &Document) -> bool {
        self.predicates
            .iter()
            .all(|(field, value)| doc.get(field) == Some(value))
    }
}

/// One page of a scan, in ascending id order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanPage {
    pub entries: Vec<(RawId, Document)>,
    /// Whether at least one more matching document follows this page.
    pub more_results: bool,
}

impl ScanPage {
    /// Build a page from matching documents already in ascending id order.
    pub fn from_matches<I>(matches: I, limit: usize, offset: usize) -> Self
    where
        I: IntoIterator<Item = (RawId, Document)>,
    {
        let mut rest = matches.into_iter().skip(offset);
        let entries: Vec<_> = rest.by_ref().take(limit).collect();
        let more_results = rest.next().is_some();
        Self {
            entries,
            more_results,
        }
    }
}

/// Async document store.
///
/// Implementations must be safe to share across request tasks and must hand
/// out ids that are never reused.
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Fetch a document, `None` if absent.
    async fn get(&self, kind: EntityKind, id: RawId) -> StorageResult<Option<Document>>;

    /// Insert or overwrite a document, returning its id.
    async fn put(&self, kind: EntityKind, key: Key, doc: Document) -> StorageResult<RawId>;

    /// Remove a document. `Ok(false)` if nothing was stored at `id`.
    async fn delete(&self, kind: EntityKind, id: RawId) -> StorageResult<bool>;

    /// Matching documents in ascending id order, skipping `offset` and
    /// returning at most `limit`.
    async fn scan(
        &self,
        kind: EntityKind,
        filter: &Filter,
        limit: usize,
        offset: usize,
    ) -> StorageResult<ScanPage>;

    /// Number of matching documents.
    async fn count(&self, kind: EntityKind, filter: &Filter) -> StorageResult<usize>;

    /// Cheap liveness probe used by the health endpoint.
    async fn health_check(&self) -> StorageResult<()> {
        Ok(())
    }
}

/// Serialize an entity into a document, dropping its `id` field.
pub fn encode_entity<T: Serialize>(kind: EntityKind, entity: &T) -> StorageResult<Document> {
    match serde_json::to_value(entity) {
        Ok(Value::Object(mut doc)) => {
            doc.remove("id");
            Ok(doc)
        }
        Ok(other) => Err(StorageError::Encode {
            kind,
            reason: format!("expected a JSON object, got {}", other),
        }),
        Err(e) => Err(StorageError::Encode {
            kind,
            reason: e.to_string(),
        }),
    }
}

/// Rebuild an entity from its stored document and key.
pub fn decode_entity<T: DeserializeOwned>(
    kind: EntityKind,
    id: RawId,
    mut doc: Document,
) -> StorageResult<T> {
    doc.insert("id".to_string(), Value::from(id));
    serde_json::from_value(Value::Object(doc)).map_err(|e| StorageError::Corrupt {
        kind,
        id,
        reason: e.to_string(),
    })
}
