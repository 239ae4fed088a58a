//! Recognition-result data model.
//!
//! A [`Detection`] is one recognized item in an image: either a block of
//! printed text with per-word geometry, or a scanned code payload. Values
//! are immutable after construction and reach the rest of the system on two
//! paths:
//!
//! - **Engine output**: [`Detection::from_text_sighting`] and
//!   [`Detection::from_code_sighting`] filter raw engine sightings
//!   (confidence threshold, empty payloads) into detections.
//! - **Cache read**: the [`codec`] module decodes previously persisted
//!   envelopes back into the same values, bit-for-bit.
//!
//! Word locations use *codepoint* offsets into the original string, not byte
//! offsets, so they survive serialization independent of the in-memory
//! string representation.

use serde::Serialize;
use unicode_segmentation::UnicodeSegmentation;

use crate::engine::{CodeSighting, TextSighting};
use crate::geometry::GeometryQuad;

pub mod codec;

/// Minimum confidence for a text sighting to become a detection.
pub const TEXT_CONFIDENCE_THRESHOLD: f64 = 0.5;

// =============================================================================
// WordBox
// =============================================================================

/// Location of one word within a recognized string.
///
/// `start` and `end` are codepoint offsets into the original text, with
/// `0 <= start <= end <= codepoint_len(text)`. The codec rejects persisted
/// entries that violate this.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WordBox {
    /// Codepoint offset of the first character of the word
    pub start: u32,

    /// Codepoint offset one past the last character of the word
    pub end: u32,

    /// Sub-rectangle of the word in normalized image space
    pub quad: GeometryQuad,
}

// =============================================================================
// Detection
// =============================================================================

/// One recognized item with its location in image space.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Detection {
    /// A recognized block of printed text
    Text {
        /// The full recognized string
        text: String,

        /// Ordered word locations within `text`
        words: Vec<WordBox>,

        /// Location of the whole block
        quad: GeometryQuad,
    },

    /// A scanned machine-readable code
    Code {
        /// Decoded payload string
        payload: String,

        /// Location of the symbol
        quad: GeometryQuad,
    },
}

impl Detection {
    /// Build a detection from a code sighting.
    ///
    /// Returns `None` for an empty payload; the sighting is discarded, not
    /// an error.
    pub fn from_code_sighting(sighting: CodeSighting) -> Option<Detection> {
        if sighting.payload.is_empty() {
            return None;
        }
        Some(Detection::Code {
            payload: sighting.payload,
            quad: sighting.quad,
        })
    }

    /// Build a detection from a text sighting.
    ///
    /// Returns `None` when the sighting's confidence is below
    /// [`TEXT_CONFIDENCE_THRESHOLD`].
    pub fn from_text_sighting(sighting: TextSighting) -> Option<Detection> {
        if sighting.confidence < TEXT_CONFIDENCE_THRESHOLD {
            return None;
        }
        Some(Detection::Text {
            text: sighting.text,
            words: sighting.words,
            quad: sighting.quad,
        })
    }

    /// Build a text detection directly from a candidate string, segmenting
    /// it into words and resolving each word's geometry through `resolver`.
    ///
    /// This is the construction path for engines that expose a per-range
    /// geometry lookup instead of ready-made word boxes. A word whose lookup
    /// yields `None` is silently dropped; the detection itself survives.
    pub fn from_text_candidate<F>(
        text: impl Into<String>,
        confidence: f64,
        quad: GeometryQuad,
        resolver: F,
    ) -> Option<Detection>
    where
        F: FnMut(u32, u32) -> Option<GeometryQuad>,
    {
        if confidence < TEXT_CONFIDENCE_THRESHOLD {
            return None;
        }
        let text = text.into();
        let words = segment_words(&text, resolver);
        Some(Detection::Text { text, words, quad })
    }

    /// The top-level quad locating this detection in image space.
    pub fn quad(&self) -> &GeometryQuad {
        match self {
            Detection::Text { quad, .. } => quad,
            Detection::Code { quad, .. } => quad,
        }
    }
}

// =============================================================================
// Word Segmentation
// =============================================================================

/// Split `text` into words at Unicode word boundaries (UAX #29) and resolve
/// each word's quad through `resolver`.
///
/// Offsets handed to the resolver (and stored in the returned boxes) are
/// codepoint offsets into `text`. Words whose resolver call returns `None`
/// are dropped.
pub fn segment_words<F>(text: &str, mut resolver: F) -> Vec<WordBox>
where
    F: FnMut(u32, u32) -> Option<GeometryQuad>,
{
    let mut words = Vec::new();

    // Single pass: track the codepoint offset of the byte cursor so each
    // byte index from the segmenter converts in O(gap), not O(text).
    let mut cp = 0u32;
    let mut byte = 0usize;

    for (word_byte, word) in text.unicode_word_indices() {
        cp += text[byte..word_byte].chars().count() as u32;
        let len = word.chars().count() as u32;

        let start = cp;
        let end = cp + len;
        if let Some(quad) = resolver(start, end) {
            words.push(WordBox { start, end, quad });
        }

        cp = end;
        byte = word_byte + word.len();
    }

    words
}

// =============================================================================
// Tests
// =============================================================================
