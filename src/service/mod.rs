//! Cache-or-compute recognition orchestration.
//!
//! [`RecognitionService`] is the entry point for recognition lookups:
//!
//! 1. Query the durable cache; a hit returns immediately with no engine
//!    work.
//! 2. On a miss, call the deferred image supplier. `None` yields an empty,
//!    *uncached* result so a later call can retry once the image exists.
//! 3. With an image in hand, run both detection passes concurrently, join
//!    on both, combine codes-then-text, persist the envelope, and return.
//!
//! # Concurrency
//!
//! The two detector futures are joined structurally (`tokio::join!`), so
//! each result lands exactly once and completion cannot double-fire; there
//! are no shared mutable completion flags. A detector error contributes an
//! empty list, never aborts the lookup.
//!
//! Concurrent lookups for the same key share one computation: the first
//! caller becomes the leader and registers an in-flight entry; followers
//! wait on it and adopt the leader's result. A leader cancelled mid-flight
//! wakes its followers through a drop guard, and one of them takes over.
//! Cancellation also abandons persistence: the cache write only happens on
//! the path that ran to completion.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use image::DynamicImage;
use parking_lot::Mutex;
use tokio::sync::Notify;
use tracing::{debug, warn};

use crate::cache::{MessageId, RecognitionCache};
use crate::detection::Detection;
use crate::engine::RecognitionEngine;
use crate::error::StoreError;
use crate::store::ItemStore;

// =============================================================================
// In-Flight Tracking
// =============================================================================

/// Shared state for one in-flight recognition computation.
#[derive(Default)]
struct InFlightScan {
    /// Wakes followers when the leader finishes or is abandoned
    notify: Notify,

    /// The leader's result, set exactly once on success
    result: Mutex<Option<Vec<Detection>>>,

    /// Set before the wakeup fires, so a follower that registered after
    /// the notification can still observe that the flight ended
    finished: AtomicBool,
}

type FlightMap = Mutex<HashMap<[u8; 8], Arc<InFlightScan>>>;

/// Removes the in-flight entry and wakes followers when the leader's
/// future completes or is dropped mid-computation.
struct FlightGuard<'a> {
    map: &'a FlightMap,
    key: [u8; 8],
    state: Arc<InFlightScan>,
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.map.lock().remove(&self.key);
        // Order matters: mark the flight finished first, then wake. A
        // follower that misses the notification still sees `finished`.
        self.state.finished.store(true, Ordering::Release);
        self.state.notify.notify_waiters();
    }
}

/// Role of a caller with respect to an in-flight computation.
enum FlightRole {
    Leader(Arc<InFlightScan>),
    Follower(Arc<InFlightScan>),
}

// =============================================================================
// RecognitionService
// =============================================================================

/// Orchestrates recognition lookups over a cache, an engine, and a lazy
/// image supplier.
///
/// # Type Parameters
///
/// * `S` - The durable item store backing the cache
/// * `E` - The recognition engine
///
/// # Example
///
/// ```ignore
/// use scancache::cache::MessageId;
/// use scancache::service::RecognitionService;
/// use scancache::store::MemoryStore;
///
/// let service = RecognitionService::new(MemoryStore::new(), engine);
///
/// let detections = service
///     .lookup(MessageId::new(12, 7001), || async { load_attachment().await })
///     .await;
/// ```
pub struct RecognitionService<S: ItemStore, E: RecognitionEngine> {
    /// Durable cache of detection envelopes
    cache: RecognitionCache<S>,

    /// The external image-analysis engine
    engine: Arc<E>,

    /// In-flight computations keyed by cache key
    in_flight: FlightMap,
}

impl<S: ItemStore, E: RecognitionEngine> RecognitionService<S, E> {
    /// Create a service over the given store and engine.
    pub fn new(store: S, engine: E) -> Self {
        Self::from_parts(RecognitionCache::new(store), Arc::new(engine))
    }

    /// Create a service from an existing cache and a shared engine.
    pub fn from_parts(cache: RecognitionCache<S>, engine: Arc<E>) -> Self {
        Self {
            cache,
            engine,
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    /// Look up the detection set for `id`, computing and caching it on a
    /// miss.
    ///
    /// `supplier` is only invoked when recognition actually has to run; it
    /// may be expensive (decode-from-disk) and may yield `None` when the
    /// image is not available, which produces an empty result that is *not*
    /// cached.
    ///
    /// Failures inside the pipeline (store errors, detector errors) degrade
    /// to fewer or no detections and are logged; the call itself is
    /// infallible.
    pub async fn lookup<F, Fut>(&self, id: MessageId, supplier: F) -> Vec<Detection>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Option<DynamicImage>>,
    {
        match self.cache.get(id).await {
            Ok(Some(results)) => return results,
            Ok(None) => {}
            Err(e) => {
                warn!(
                    namespace = id.namespace,
                    id = id.id,
                    error = %e,
                    "cache read failed; recomputing"
                );
            }
        }

        let key = id.cache_key();

        // Become leader, or follow an existing flight for this key.
        let state = loop {
            let role = {
                let mut in_flight = self.in_flight.lock();
                match in_flight.entry(key) {
                    Entry::Occupied(entry) => FlightRole::Follower(entry.get().clone()),
                    Entry::Vacant(slot) => {
                        let state = Arc::new(InFlightScan::default());
                        slot.insert(state.clone());
                        FlightRole::Leader(state)
                    }
                }
            };

            match role {
                FlightRole::Leader(state) => break state,
                FlightRole::Follower(state) => {
                    if let Some(results) = wait_for_leader(&state).await {
                        debug!(
                            namespace = id.namespace,
                            id = id.id,
                            "adopted in-flight recognition result"
                        );
                        return results;
                    }
                    // Leader abandoned without a result; retry the flight.
                }
            }
        };

        let guard = FlightGuard {
            map: &self.in_flight,
            key,
            state: state.clone(),
        };

        let results = self.recognize(id, supplier).await;
        *state.result.lock() = Some(results.clone());
        drop(guard);

        results
    }

    /// Remove any cached detection set for `id`.
    ///
    /// The next `lookup` for this key recomputes from scratch.
    pub async fn clear(&self, id: MessageId) -> Result<(), StoreError> {
        self.cache.put(id, None).await
    }

    /// Run recognition for one key: supplier, concurrent detectors,
    /// persistence.
    async fn recognize<F, Fut>(&self, id: MessageId, supplier: F) -> Vec<Detection>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Option<DynamicImage>>,
    {
        let Some(image) = supplier().await else {
            debug!(
                namespace = id.namespace,
                id = id.id,
                "image unavailable; returning empty uncached result"
            );
            return Vec::new();
        };

        let (codes, texts) = tokio::join!(
            self.engine.detect_codes(&image),
            self.engine.detect_text(&image)
        );

        // A failed pass contributes nothing; the other pass still counts.
        let codes = codes.unwrap_or_else(|e| {
            warn!(namespace = id.namespace, id = id.id, error = %e, "code detection failed");
            Vec::new()
        });
        let texts = texts.unwrap_or_else(|e| {
            warn!(namespace = id.namespace, id = id.id, error = %e, "text detection failed");
            Vec::new()
        });

        let mut results: Vec<Detection> = codes
            .into_iter()
            .filter_map(Detection::from_code_sighting)
            .collect();
        results.extend(texts.into_iter().filter_map(Detection::from_text_sighting));

        debug!(
            namespace = id.namespace,
            id = id.id,
            count = results.len(),
            "recognition complete"
        );

        // "No detections" is terminal and cacheable; a missing image is not.
        if let Err(e) = self.cache.put(id, Some(&results)).await {
            warn!(
                namespace = id.namespace,
                id = id.id,
                error = %e,
                "failed to persist recognition results"
            );
        }

        results
    }
}

/// Wait for an in-flight leader to finish.
///
/// Returns `None` when the leader was abandoned before setting a result.
/// The notified future is enabled *before* checking the flight state so a
/// leader finishing in between cannot produce a lost wakeup; a flight that
/// already ended (`finished`) returns immediately, covering a guard drop
/// that ran before this follower registered at all.
async fn wait_for_leader(state: &InFlightScan) -> Option<Vec<Detection>> {
    let notified = state.notify.notified();
    tokio::pin!(notified);
    notified.as_mut().enable();

    if let Some(results) = state.result.lock().clone() {
        return Some(results);
    }
    if state.finished.load(Ordering::Acquire) {
        // Ended without a result; the wakeup may have fired before we
        // registered, so do not wait for one.
        return None;
    }

    notified.await;
    state.result.lock().clone()
}

// =============================================================================
// Tests
// =============================================================================
