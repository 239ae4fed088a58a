//! Keyed durable cache of recognition results.
//!
//! Maps a message identifier to the envelope of detections previously
//! computed for that message's image. The cache wraps an external
//! [`ItemStore`] and owns key derivation, envelope encoding, and the
//! degrade-to-miss handling for corrupt entries.
//!
//! # Key derivation
//!
//! A [`MessageId`] is a `(namespace, id)` pair of 32-bit integers. The
//! cache key packs both little-endian into 8 bytes. Endianness is fixed:
//! a writer and a reader of the same store must always agree, and this
//! crate is both.
//!
//! # Lifecycle
//!
//! An entry is created on first successful recognition and never
//! overwritten by the lookup path: presence is terminal, a hit permanently
//! short-circuits recomputation. The only removal is an explicit clear
//! (`put(id, None)`).

use std::sync::Arc;

use tracing::{debug, warn};

use crate::detection::{codec, Detection};
use crate::error::StoreError;
use crate::store::{CapacityPolicy, CollectionId, ItemStore};

// =============================================================================
// Configuration
// =============================================================================

/// Collection holding detection envelopes. Must stay distinct from every
/// other artifact collection sharing the store.
pub const DETECTION_COLLECTION: CollectionId = CollectionId(4);

/// Entry count the store trims down to after an overflow.
pub const CACHE_LOW_WATER: usize = 50;

/// Entry count that triggers eviction in the store.
pub const CACHE_HIGH_WATER: usize = 100;

const CAPACITY_POLICY: CapacityPolicy = CapacityPolicy {
    low: CACHE_LOW_WATER,
    high: CACHE_HIGH_WATER,
};

// =============================================================================
// MessageId
// =============================================================================

/// Identifier of the message whose image a detection set belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageId {
    /// Namespace (e.g. conversation or account scope)
    pub namespace: i32,

    /// Message id within the namespace
    pub id: i32,
}

impl MessageId {
    /// Create a new message identifier.
    pub fn new(namespace: i32, id: i32) -> Self {
        Self { namespace, id }
    }

    /// Derive the fixed 8-byte cache key: namespace then id, both
    /// little-endian.
    pub fn cache_key(&self) -> [u8; 8] {
        let mut key = [0u8; 8];
        key[..4].copy_from_slice(&self.namespace.to_le_bytes());
        key[4..].copy_from_slice(&self.id.to_le_bytes());
        key
    }
}

// =============================================================================
// RecognitionCache
// =============================================================================

/// Durable cache of detection envelopes keyed by message identifier.
pub struct RecognitionCache<S: ItemStore> {
    store: Arc<S>,
}

impl<S: ItemStore> RecognitionCache<S> {
    /// Create a cache over the given store.
    pub fn new(store: S) -> Self {
        Self {
            store: Arc::new(store),
        }
    }

    /// Create a cache over a shared store.
    pub fn with_shared_store(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Read the detection set cached for `id`.
    ///
    /// Returns `Ok(None)` when no entry exists *or* when the stored bytes
    /// fail to decode; a corrupt entry is a logged miss, never a caller
    /// failure. Store errors do propagate so the caller can decide how to
    /// degrade.
    pub async fn get(&self, id: MessageId) -> Result<Option<Vec<Detection>>, StoreError> {
        let key = id.cache_key();
        let Some(bytes) = self.store.get(DETECTION_COLLECTION, &key).await? else {
            return Ok(None);
        };

        match codec::decode(&bytes) {
            Ok(detections) => {
                debug!(
                    namespace = id.namespace,
                    id = id.id,
                    count = detections.len(),
                    "recognition cache hit"
                );
                Ok(Some(detections))
            }
            Err(e) => {
                warn!(
                    namespace = id.namespace,
                    id = id.id,
                    error = %e,
                    "cached envelope failed to decode; treating as miss"
                );
                Ok(None)
            }
        }
    }

    /// Write or clear the detection set for `id`.
    ///
    /// `Some` serializes and upserts under the watermark capacity policy;
    /// `None` removes the entry. Either way the underlying store call is
    /// transactional.
    pub async fn put(
        &self,
        id: MessageId,
        results: Option<&[Detection]>,
    ) -> Result<(), StoreError> {
        let key = id.cache_key();
        match results {
            Some(detections) => {
                let bytes = codec::encode(detections);
                self.store
                    .put(DETECTION_COLLECTION, key, bytes, CAPACITY_POLICY)
                    .await
            }
            None => self.store.delete(DETECTION_COLLECTION, &key).await,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
