//! In-memory document store.
//!
//! Backed by one `BTreeMap` per kind so scans come out in ascending id order
//! without sorting. Used by tests and when no store path is configured.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use ::async_trait::async_trait;
use marina_core::{EntityKind, RawId, StorageError};
use tokio::sync::RwLock;

use crate::store::{Document, EntityStore, Filter, Key, ScanPage, StorageResult};

#[derive(Debug, Default)]
struct Tables {
    boats: BTreeMap<RawId, Document>,
    loads: BTreeMap<RawId, Document>,
    users: BTreeMap<RawId, Document>,
}

impl Tables {
    fn table(&self, kind: EntityKind) -> &BTreeMap<RawId, Document> {
        match kind {
            EntityKind::Boat => &self.boats,
            EntityKind::Load => &self.loads,
            EntityKind::User => &self.users,
        }
    }

    fn table_mut(&mut self, kind: EntityKind) -> &mut BTreeMap<RawId, Document> {
        match kind {
            EntityKind::Boat => &mut self.boats,
            EntityKind::Load => &mut self.loads,
            EntityKind::User => &mut self.users,
        }
    }
}

/// In-memory store. Clones share the same tables.
#[derive(Debug, Clone)]
pub struct InMemoryEntityStore {
    tables: Arc<RwLock<Tables>>,
    next_id: Arc<AtomicU64>,
}

impl Default for InMemoryEntityStore {
    fn default() -> Self {
        Self {
            tables: Arc::new(RwLock::new(Tables::default())),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }
}

impl InMemoryEntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate_id(&self) -> StorageResult<RawId> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        if id == RawId::MAX {
            return Err(StorageError::IdsExhausted);
        }
        Ok(id)
    }
}

#[async_trait]
impl EntityStore for InMemoryEntityStore {
    async fn get(&self, kind: EntityKind, id: RawId) -> StorageResult<Option<Document>> {
        let tables = self.tables.read().await;
        Ok(tables.table(kind).get(&id).cloned())
    }

    async fn put(&self, kind: EntityKind, key: Key, doc: Document) -> StorageResult<RawId> {
        let id = match key {
            Key::New => self.allocate_id()?,
            Key::Id(id) => id,
        };
        let mut tables = self.tables.write().await;
        tables.table_mut(kind).insert(id, doc);
        Ok(id)
    }

    async fn delete(&self, kind: EntityKind, id: RawId) -> StorageResult<bool> {
        let mut tables = self.tables.write().await;
        Ok(tables.table_mut(kind).remove(&id).is_some())
    }

    async fn scan(
        &self,
        kind: EntityKind,
        filter: &Filter,
        limit: usize,
        offset: usize,
    ) -> StorageResult<ScanPage> {
        let tables = self.tables.read().await;
        let matches = tables
            .table(kind)
            .iter()
            .filter(|(_, doc)| filter.matches(doc))
            .map(|(id, doc)| (*id, doc.clone()));
        Ok(ScanPage::from_matches(matches, limit, offset))
    }

    async fn count(&self, kind: EntityKind, filter: &Filter) -> StorageResult<usize> {
        let tables = self.tables.read().await;
        Ok(tables
            .table(kind)
            .values()
            .filter(|doc| filter.matches(doc))
            .count())
    }
}
