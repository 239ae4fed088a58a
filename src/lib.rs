//! # scancache
//!
//! A caching layer for structured-content recognition in raster images.
//!
//! scancache recognizes printed text and QR codes in an image, associates
//! the result with a durable cache key derived from a message identifier,
//! and serves subsequent lookups for the same image from that cache instead
//! of re-running recognition.
//!
//! ## Features
//!
//! - **Stable data model**: normalized quad geometry with pure derived
//!   measurements and pixel-canvas conversion
//! - **Binary-stable envelopes**: versioned, strict, exactly round-tripping
//!   serialization of detection sets
//! - **Cache-or-compute orchestration**: at-most-one computation per key
//!   under concurrent callers, concurrent code/text detection passes, and
//!   graceful degradation on partial failures
//! - **Pluggable collaborators**: the image-analysis engine and the durable
//!   store are trait seams; an in-memory store ships in-crate
//!
//! ## Architecture
//!
//! - [`geometry`] - normalized detection geometry (`GeometryQuad`)
//! - [`detection`] - the `Detection` model and its binary envelope codec
//! - [`engine`] - the recognition-engine seam
//! - [`store`] - the durable transactional item-store seam
//! - [`cache`] - key derivation and the keyed envelope cache
//! - [`service`] - the cache-or-compute orchestrator
//!
//! ## Example
//!
//! ```ignore
//! use scancache::{MemoryStore, MessageId, RecognitionService};
//!
//! let service = RecognitionService::new(MemoryStore::new(), engine);
//!
//! // First call runs both detectors and persists the envelope; later
//! // calls for the same id return the cached detections untouched.
//! let detections = service
//!     .lookup(MessageId::new(12, 7001), || async { load_image().await })
//!     .await;
//! ```

pub mod cache;
pub mod detection;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod service;
pub mod store;

// Re-export commonly used types
pub use cache::{
    MessageId, RecognitionCache, CACHE_HIGH_WATER, CACHE_LOW_WATER, DETECTION_COLLECTION,
};
pub use detection::codec::{decode, encode, ENVELOPE_VERSION};
pub use detection::{segment_words, Detection, WordBox, TEXT_CONFIDENCE_THRESHOLD};
pub use engine::{CodeSighting, RecognitionEngine, TextSighting};
pub use error::{CodecError, EngineError, StoreError};
pub use geometry::{EdgeInsets, GeometryQuad, Point, Rect, Size};
pub use service::RecognitionService;
pub use store::{CapacityPolicy, CollectionId, ItemKey, ItemStore, MemoryStore};
