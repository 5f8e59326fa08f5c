//! Marina Storage - Document Store Trait and Implementations
//!
//! Defines the storage abstraction the registries persist through, plus an
//! in-memory store for tests and single-process runs and an LMDB store for
//! persistent deployments.

pub mod lmdb;
pub mod memory;
pub mod store;

pub use lmdb::{LmdbEntityStore, LmdbStoreError};
pub use memory::InMemoryEntityStore;
pub use store::{
    decode_entity, encode_entity, Document, EntityStore, Filter, Key, ScanPage, StorageResult,
};
