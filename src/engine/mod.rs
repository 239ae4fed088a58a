//! Recognition engine seam.
//!
//! The actual image analysis (OCR, barcode symbology decoding) lives outside
//! this crate. [`RecognitionEngine`] is the capability boundary: given a
//! decoded bitmap it runs two independent detection passes and reports typed
//! sightings with confidence and geometry. The two passes may run
//! concurrently and fail independently; the service layer maps a failed pass
//! to an empty contribution rather than aborting the lookup.

use async_trait::async_trait;
use image::DynamicImage;

use crate::detection::WordBox;
use crate::error::EngineError;
use crate::geometry::GeometryQuad;

// =============================================================================
// Sightings
// =============================================================================

/// A scanned machine-readable code reported by the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct CodeSighting {
    /// Decoded payload string
    pub payload: String,

    /// Location of the symbol in normalized image space
    pub quad: GeometryQuad,
}

/// A recognized text block reported by the engine.
///
/// `words` locate individual words inside `text` by codepoint offsets into
/// the original string; engine adapters typically build them with
/// [`crate::detection::segment_words`].
#[derive(Debug, Clone, PartialEq)]
pub struct TextSighting {
    /// Full recognized string (best candidate)
    pub text: String,

    /// Confidence of the best candidate, in `[0, 1]`
    pub confidence: f64,

    /// Per-word sub-rectangles anchored to codepoint offsets
    pub words: Vec<WordBox>,

    /// Location of the whole block in normalized image space
    pub quad: GeometryQuad,
}

// =============================================================================
// RecognitionEngine Trait
// =============================================================================

/// Trait for image-analysis backends.
///
/// Both methods take the same decoded bitmap and may be invoked
/// concurrently. "No results" is an `Ok` with an empty vector; an `Err`
/// means that pass failed as a whole.
#[async_trait]
pub trait RecognitionEngine: Send + Sync {
    /// Detect machine-readable codes (QR symbology) in the image.
    async fn detect_codes(&self, image: &DynamicImage) -> Result<Vec<CodeSighting>, EngineError>;

    /// Detect printed text in the image.
    async fn detect_text(&self, image: &DynamicImage) -> Result<Vec<TextSighting>, EngineError>;
}
