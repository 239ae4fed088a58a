//! Durable transactional item store seam.
//!
//! The cache persists envelopes through an external key-value store
//! addressed by a collection id plus a fixed 8-byte key. The store is an
//! opaque collaborator: each call is transactional (it fully applies or not
//! at all) and the store owns its own recency bookkeeping for capacity
//! eviction. [`MemoryStore`] is the in-process reference implementation,
//! used by tests and by embedders without a durable backend.

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::StoreError;

mod memory;

pub use memory::MemoryStore;

/// Fixed-width key addressing one item within a collection.
pub type ItemKey = [u8; 8];

/// Identifier of one collection of cached artifacts.
///
/// Collections partition the store by artifact type; capacity policies
/// apply per collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CollectionId(pub u32);

/// Watermark capacity policy for a collection.
///
/// When a put pushes the collection past `high`, the store evicts its
/// least-recently-used entries down to `low`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapacityPolicy {
    /// Entry count to trim down to after an overflow
    pub low: usize,

    /// Entry count that triggers eviction
    pub high: usize,
}

impl CapacityPolicy {
    /// Create a watermark policy.
    pub fn new(low: usize, high: usize) -> Self {
        Self { low, high }
    }
}

/// Trait for transactional key-value storage backends.
#[async_trait]
pub trait ItemStore: Send + Sync {
    /// Read the item stored under `key`, if any.
    async fn get(&self, collection: CollectionId, key: &ItemKey)
        -> Result<Option<Bytes>, StoreError>;

    /// Upsert an item, then apply `policy` to the collection.
    async fn put(
        &self,
        collection: CollectionId,
        key: ItemKey,
        value: Bytes,
        policy: CapacityPolicy,
    ) -> Result<(), StoreError>;

    /// Remove the item stored under `key`. Removing an absent key is not an
    /// error.
    async fn delete(&self, collection: CollectionId, key: &ItemKey) -> Result<(), StoreError>;
}
