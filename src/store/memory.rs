//! In-memory reference implementation of [`ItemStore`].

use std::collections::HashMap;

use async_trait::async_trait;
use bytes::Bytes;
use lru::LruCache;
use tokio::sync::RwLock;

use crate::error::StoreError;

use super::{CapacityPolicy, CollectionId, ItemKey, ItemStore};

/// In-memory item store with per-collection LRU recency and watermark
/// eviction.
///
/// Each operation takes the write lock for its full duration, so a call is
/// atomic with respect to concurrent callers: the transactional contract of
/// [`ItemStore`] holds trivially.
///
/// # Example
///
/// ```
/// use scancache::store::{CapacityPolicy, CollectionId, ItemStore, MemoryStore};
/// use bytes::Bytes;
///
/// #[tokio::main]
/// async fn main() {
///     let store = MemoryStore::new();
///     let collection = CollectionId(1);
///     let policy = CapacityPolicy::new(50, 100);
///
///     store
///         .put(collection, *b"00000001", Bytes::from_static(b"blob"), policy)
///         .await
///         .unwrap();
///     let read = store.get(collection, b"00000001").await.unwrap();
///     assert_eq!(read, Some(Bytes::from_static(b"blob")));
/// }
/// ```
#[derive(Default)]
pub struct MemoryStore {
    /// Collections indexed by id; each is an unbounded LRU trimmed by the
    /// capacity policy passed to `put`.
    collections: RwLock<HashMap<CollectionId, LruCache<ItemKey, Bytes>>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of items currently held in a collection.
    pub async fn len(&self, collection: CollectionId) -> usize {
        let collections = self.collections.read().await;
        collections.get(&collection).map_or(0, |c| c.len())
    }

    /// Whether a collection holds no items.
    pub async fn is_empty(&self, collection: CollectionId) -> bool {
        self.len(collection).await == 0
    }
}

#[async_trait]
impl ItemStore for MemoryStore {
    async fn get(
        &self,
        collection: CollectionId,
        key: &ItemKey,
    ) -> Result<Option<Bytes>, StoreError> {
        let mut collections = self.collections.write().await;
        // get() refreshes recency, matching a durable store's LRU policy.
        Ok(collections
            .get_mut(&collection)
            .and_then(|c| c.get(key).cloned()))
    }

    async fn put(
        &self,
        collection: CollectionId,
        key: ItemKey,
        value: Bytes,
        policy: CapacityPolicy,
    ) -> Result<(), StoreError> {
        let mut collections = self.collections.write().await;
        let cache = collections
            .entry(collection)
            .or_insert_with(LruCache::unbounded);

        cache.put(key, value);

        if cache.len() > policy.high {
            while cache.len() > policy.low {
                if cache.pop_lru().is_none() {
                    break;
                }
            }
        }

        Ok(())
    }

    async fn delete(&self, collection: CollectionId, key: &ItemKey) -> Result<(), StoreError> {
        let mut collections = self.collections.write().await;
        if let Some(cache) = collections.get_mut(&collection) {
            cache.pop(key);
        }
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
