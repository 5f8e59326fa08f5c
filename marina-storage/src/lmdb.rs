//! LMDB-backed document store.
//!
//! Uses the heed crate (Rust bindings for LMDB) to persist documents in a
//! single memory-mapped database.
//!
//! # Key layout
//!
//! - `[kind tag: 1 byte][id: 8 bytes big-endian]` for documents, so a prefix
//!   iteration over one kind yields ascending ids.
//! - `[0xFF]["next_id"]` holds the id sequence, updated in the same write
//!   transaction as the insert that consumes it.

use std::path::Path;

use ::async_trait::async_trait;
use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions, RoTxn, RwTxn};
use marina_core::{EntityKind, RawId, StorageError};

use crate::store::{Document, EntityStore, Filter, Key, ScanPage, StorageResult};

const SEQUENCE_KEY: &[u8] = b"\xFFnext_id";

/// Error type for opening the LMDB store.
#[derive(Debug, thiserror::Error)]
pub enum LmdbStoreError {
    /// Failed to open or create the LMDB environment.
    #[error("Failed to open LMDB environment: {0}")]
    EnvOpen(String),

    /// Failed to open the database within the environment.
    #[error("Failed to open database: {0}")]
    DbOpen(String),

    /// Transaction error.
    #[error("Transaction error: {0}")]
    Transaction(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<LmdbStoreError> for StorageError {
    fn from(e: LmdbStoreError) -> Self {
        StorageError::backend("open", e)
    }
}

fn kind_tag(kind: EntityKind) -> u8 {
    match kind {
        EntityKind::Boat => 1,
        EntityKind::Load => 2,
        EntityKind::User => 3,
    }
}

fn encode_key(kind: EntityKind, id: RawId) -> [u8; 9] {
    let mut key = [0u8; 9];
    key[0] = kind_tag(kind);
    key[1..].copy_from_slice(&id.to_be_bytes());
    key
}

fn decode_key_id(key: &[u8]) -> Option<RawId> {
    let bytes: [u8; 8] = key.get(1..9)?.try_into().ok()?;
    Some(RawId::from_be_bytes(bytes))
}

/// Persistent store in an LMDB environment directory.
pub struct LmdbEntityStore {
    env: Env,
    db: Database<Bytes, Bytes>,
}

impl LmdbEntityStore {
    /// Open (or create) the store.
    ///
    /// # Arguments
    ///
    /// * `path` - Directory where LMDB files will be stored
    /// * `max_size_mb` - Maximum size of the database in megabytes
    pub fn open<P: AsRef<Path>>(path: P, max_size_mb: usize) -> Result<Self, LmdbStoreError> {
        std::fs::create_dir_all(&path)?;

        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(max_size_mb * 1024 * 1024)
                .max_dbs(1)
                .open(path.as_ref())
        }
        .map_err(|e| LmdbStoreError::EnvOpen(e.to_string()))?;

        let mut wtxn = env
            .write_txn()
            .map_err(|e| LmdbStoreError::Transaction(e.to_string()))?;

        let db: Database<Bytes, Bytes> = env
            .create_database(&mut wtxn, None)
            .map_err(|e| LmdbStoreError::DbOpen(e.to_string()))?;

        wtxn.commit()
            .map_err(|e| LmdbStoreError::Transaction(e.to_string()))?;

        Ok(Self { env, db })
    }

    fn read_txn(&self) -> StorageResult<RoTxn<'_>> {
        self.env
            .read_txn()
            .map_err(|e| StorageError::backend("read transaction", e))
    }

    fn write_txn(&self) -> StorageResult<RwTxn<'_>> {
        self.env
            .write_txn()
            .map_err(|e| StorageError::backend("write transaction", e))
    }

    fn decode_doc(kind: EntityKind, id: RawId, bytes: &[u8]) -> StorageResult<Document> {
        serde_json::from_slice(bytes).map_err(|e| StorageError::Corrupt {
            kind,
            id,
            reason: e.to_string(),
        })
    }

    fn next_id(&self, wtxn: &RwTxn<'_>) -> StorageResult<RawId> {
        let stored = self
            .db
            .get(wtxn, SEQUENCE_KEY)
            .map_err(|e| StorageError::backend("read id sequence", e))?;
        match stored {
            None => Ok(1),
            Some(bytes) => {
                let bytes: [u8; 8] = bytes
                    .try_into()
                    .map_err(|_| StorageError::backend("read id sequence", "malformed sequence value"))?;
                Ok(RawId::from_be_bytes(bytes))
            }
        }
    }

    /// Visit documents of `kind` matching `filter` in ascending id order.
    /// The visitor returns `false` to stop early.
    fn for_each_match<F>(&self, kind: EntityKind, filter: &Filter, mut visit: F) -> StorageResult<()>
    where
        F: FnMut(RawId, Document) -> bool,
    {
        let rtxn = self.read_txn()?;
        let prefix = [kind_tag(kind)];
        let iter = self
            .db
            .prefix_iter(&rtxn, &prefix[..])
            .map_err(|e| StorageError::backend("scan", e))?;

        for result in iter {
            let (key, bytes) = result.map_err(|e| StorageError::backend("scan", e))?;
            let Some(id) = decode_key_id(key) else {
                continue;
            };
            let doc = Self::decode_doc(kind, id, bytes)?;
            if filter.matches(&doc) && !visit(id, doc) {
                break;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl EntityStore for LmdbEntityStore {
    async fn get(&self, kind: EntityKind, id: RawId) -> StorageResult<Option<Document>> {
        let rtxn = self.read_txn()?;
        let stored = self
            .db
            .get(&rtxn, &encode_key(kind, id)[..])
            .map_err(|e| StorageError::backend("get", e))?;
        stored
            .map(|bytes| Self::decode_doc(kind, id, bytes))
            .transpose()
    }

    async fn put(&self, kind: EntityKind, key: Key, doc: Document) -> StorageResult<RawId> {
        let value = serde_json::to_vec(&doc).map_err(|e| StorageError::Encode {
            kind,
            reason: e.to_string(),
        })?;

        let mut wtxn = self.write_txn()?;
        let next = self.next_id(&wtxn)?;
        let id = match key {
            Key::New => next,
            Key::Id(id) => id,
        };
        // Explicit ids past the sequence push it forward so `Key::New` never collides.
        if id >= next {
            let bumped = id.checked_add(1).ok_or(StorageError::IdsExhausted)?;
            self.db
                .put(&mut wtxn, SEQUENCE_KEY, &bumped.to_be_bytes())
                .map_err(|e| StorageError::backend("write id sequence", e))?;
        }

        self.db
            .put(&mut wtxn, &encode_key(kind, id)[..], &value)
            .map_err(|e| StorageError::backend("put", e))?;

        wtxn.commit()
            .map_err(|e| StorageError::backend("commit", e))?;
        Ok(id)
    }

    async fn delete(&self, kind: EntityKind, id: RawId) -> StorageResult<bool> {
        let mut wtxn = self.write_txn()?;
        let deleted = self
            .db
            .delete(&mut wtxn, &encode_key(kind, id)[..])
            .map_err(|e| StorageError::backend("delete", e))?;
        wtxn.commit()
            .map_err(|e| StorageError::backend("commit", e))?;
        Ok(deleted)
    }

    async fn scan(
        &self,
        kind: EntityKind,
        filter: &Filter,
        limit: usize,
        offset: usize,
    ) -> StorageResult<ScanPage> {
        let mut skipped = 0usize;
        let mut page = ScanPage::default();
        self.for_each_match(kind, filter, |id, doc| {
            if skipped < offset {
                skipped += 1;
                return true;
            }
            if page.entries.len() == limit {
                page.more_results = true;
                return false;
            }
            page.entries.push((id, doc));
            true
        })?;
        Ok(page)
    }

    async fn count(&self, kind: EntityKind, filter: &Filter) -> StorageResult<usize> {
        let mut count = 0usize;
        self.for_each_match(kind, filter, |_, _| {
            count += 1;
            true
        })?;
        Ok(count)
    }

    async fn health_check(&self) -> StorageResult<()> {
        self.read_txn().map(|_| ())
    }
}
