//! Shared fixtures for integration tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use image::DynamicImage;

use scancache::store::ItemKey;
use scancache::{
    CapacityPolicy, CodeSighting, CollectionId, Detection, EngineError, GeometryQuad, ItemStore,
    Point, RecognitionEngine, StoreError, TextSighting,
};

/// A small decoded bitmap for lookups that need one.
pub fn test_image() -> DynamicImage {
    DynamicImage::new_rgba8(8, 8)
}

/// A quad offset by `seed` so distinct fixtures stay distinguishable.
pub fn sample_quad(seed: f64) -> GeometryQuad {
    GeometryQuad::new(
        Point::new(seed, seed + 0.2),
        Point::new(seed + 0.1, seed + 0.2),
        Point::new(seed, seed),
        Point::new(seed + 0.1, seed),
    )
}

/// Readable labels for asserting on mixed detection lists.
pub fn labels(detections: &[Detection]) -> Vec<String> {
    detections
        .iter()
        .map(|d| match d {
            Detection::Code { payload, .. } => format!("code:{payload}"),
            Detection::Text { text, .. } => format!("text:{text}"),
        })
        .collect()
}

// =============================================================================
// Mock Engine
// =============================================================================

/// Recognition engine stub with scripted sightings, failure switches, and
/// per-pass delays for exercising completion order.
#[derive(Default)]
pub struct MockEngine {
    pub codes: Vec<CodeSighting>,
    pub texts: Vec<TextSighting>,
    pub fail_codes: bool,
    pub fail_texts: bool,
    pub code_delay: Option<Duration>,
    pub text_delay: Option<Duration>,
    pub code_calls: AtomicUsize,
    pub text_calls: AtomicUsize,
}

impl MockEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn code(mut self, payload: &str) -> Self {
        self.codes.push(CodeSighting {
            payload: payload.to_string(),
            quad: sample_quad(self.codes.len() as f64 * 0.1),
        });
        self
    }

    pub fn text(mut self, text: &str, confidence: f64) -> Self {
        self.texts.push(TextSighting {
            text: text.to_string(),
            confidence,
            words: vec![],
            quad: sample_quad(0.5 + self.texts.len() as f64 * 0.1),
        });
        self
    }

    pub fn engine_invocations(&self) -> usize {
        // Both passes run per recognition; count one pass as the unit.
        self.code_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RecognitionEngine for MockEngine {
    async fn detect_codes(&self, _image: &DynamicImage) -> Result<Vec<CodeSighting>, EngineError> {
        self.code_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.code_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_codes {
            return Err(EngineError::Detector("code pass failed".into()));
        }
        Ok(self.codes.clone())
    }

    async fn detect_text(&self, _image: &DynamicImage) -> Result<Vec<TextSighting>, EngineError> {
        self.text_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.text_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_texts {
            return Err(EngineError::Detector("text pass failed".into()));
        }
        Ok(self.texts.clone())
    }
}

// =============================================================================
// Failing Store
// =============================================================================

/// An item store whose every operation fails, for exercising degradation.
#[derive(Default)]
pub struct FailingStore;

#[async_trait]
impl ItemStore for FailingStore {
    async fn get(
        &self,
        _collection: CollectionId,
        _key: &ItemKey,
    ) -> Result<Option<Bytes>, StoreError> {
        Err(StoreError::Backend("store offline".into()))
    }

    async fn put(
        &self,
        _collection: CollectionId,
        _key: ItemKey,
        _value: Bytes,
        _policy: CapacityPolicy,
    ) -> Result<(), StoreError> {
        Err(StoreError::Transaction("store offline".into()))
    }

    async fn delete(&self, _collection: CollectionId, _key: &ItemKey) -> Result<(), StoreError> {
        Err(StoreError::Transaction("store offline".into()))
    }
}
