//! Binary envelope codec for detection sets.
//!
//! An *envelope* is the ordered list of detections persisted for one cache
//! key. The encoding is the unit both stored in the durable cache and,
//! conceptually, moved over any wire, so it must round-trip exactly.
//!
//! # Wire layout
//!
//! All integers are little-endian. Strings are a `u32` byte length followed
//! by UTF-8 bytes. Quads are eight `f64` values in fixed corner order:
//! `tl.x tl.y tr.x tr.y bl.x bl.y br.x br.y`.
//!
//! ```text
//! envelope := version:u8 (=1)  count:u32  record*
//! record   := disc:u8  body
//! disc 0   := text:string  word_count:u32  (start:u32 end:u32 quad)*  quad
//! disc 1   := payload:string  quad
//! ```
//!
//! # Strictness
//!
//! Decoding is strict: truncated input, invalid UTF-8, an unknown version
//! or discriminator, word offsets outside the text, and trailing bytes are
//! all hard errors. There is deliberately no lenient fallback that would
//! substitute placeholder records for unknown tags; corrupt or
//! incompatible envelopes must read as cache misses upstream, never as
//! fabricated detections.

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::CodecError;
use crate::geometry::{GeometryQuad, Point};

use super::{Detection, WordBox};

/// Current envelope format version.
pub const ENVELOPE_VERSION: u8 = 1;

/// Discriminator for text records.
const DISC_TEXT: u8 = 0;

/// Discriminator for code records.
const DISC_CODE: u8 = 1;

// =============================================================================
// Encoding
// =============================================================================

/// Encode an ordered detection set into its envelope representation.
pub fn encode(detections: &[Detection]) -> Bytes {
    let mut buf = BytesMut::new();
    buf.put_u8(ENVELOPE_VERSION);
    buf.put_u32_le(detections.len() as u32);

    for detection in detections {
        match detection {
            Detection::Text { text, words, quad } => {
                buf.put_u8(DISC_TEXT);
                put_string(&mut buf, text);
                buf.put_u32_le(words.len() as u32);
                for word in words {
                    buf.put_u32_le(word.start);
                    buf.put_u32_le(word.end);
                    put_quad(&mut buf, &word.quad);
                }
                put_quad(&mut buf, quad);
            }
            Detection::Code { payload, quad } => {
                buf.put_u8(DISC_CODE);
                put_string(&mut buf, payload);
                put_quad(&mut buf, quad);
            }
        }
    }

    buf.freeze()
}

fn put_string(buf: &mut BytesMut, s: &str) {
    buf.put_u32_le(s.len() as u32);
    buf.put_slice(s.as_bytes());
}

fn put_quad(buf: &mut BytesMut, quad: &GeometryQuad) {
    for point in [
        quad.top_left,
        quad.top_right,
        quad.bottom_left,
        quad.bottom_right,
    ] {
        buf.put_f64_le(point.x);
        buf.put_f64_le(point.y);
    }
}

// =============================================================================
// Decoding
// =============================================================================

/// Decode an envelope back into its ordered detection set.
///
/// # Errors
///
/// - `UnsupportedVersion` / `UnknownDiscriminator` for incompatible bytes
/// - `UnexpectedEof` when any field is truncated
/// - `InvalidUtf8` for malformed string fields
/// - `InvalidWordRange` when word offsets violate
///   `0 <= start <= end <= codepoint_len(text)`
/// - `TrailingBytes` when input continues past the declared record count
pub fn decode(bytes: &[u8]) -> Result<Vec<Detection>, CodecError> {
    let mut reader = WireReader::new(bytes);

    let version = reader.read_u8()?;
    if version != ENVELOPE_VERSION {
        return Err(CodecError::UnsupportedVersion(version));
    }

    let count = reader.read_u32()?;
    let mut detections = Vec::with_capacity(count.min(1024) as usize);

    for _ in 0..count {
        detections.push(read_detection(&mut reader)?);
    }

    if reader.remaining() > 0 {
        return Err(CodecError::TrailingBytes(reader.remaining()));
    }

    Ok(detections)
}

fn read_detection(reader: &mut WireReader<'_>) -> Result<Detection, CodecError> {
    let disc = reader.read_u8()?;
    match disc {
        DISC_TEXT => {
            let text = reader.read_string()?;
            let codepoint_len = text.chars().count() as u32;

            let word_count = reader.read_u32()?;
            let mut words = Vec::with_capacity(word_count.min(1024) as usize);
            for _ in 0..word_count {
                let start = reader.read_u32()?;
                let end = reader.read_u32()?;
                let quad = reader.read_quad()?;
                if start > end || end > codepoint_len {
                    return Err(CodecError::InvalidWordRange {
                        start,
                        end,
                        len: codepoint_len,
                    });
                }
                words.push(WordBox { start, end, quad });
            }

            let quad = reader.read_quad()?;
            Ok(Detection::Text { text, words, quad })
        }
        DISC_CODE => {
            let payload = reader.read_string()?;
            let quad = reader.read_quad()?;
            Ok(Detection::Code { payload, quad })
        }
        other => Err(CodecError::UnknownDiscriminator(other)),
    }
}

// =============================================================================
// Wire Reader
// =============================================================================

/// Bounds-checked cursor over an envelope byte slice.
struct WireReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> WireReader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], CodecError> {
        if self.remaining() < len {
            return Err(CodecError::UnexpectedEof {
                offset: self.pos,
                needed: len - self.remaining(),
            });
        }
        let slice = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    fn read_u8(&mut self) -> Result<u8, CodecError> {
        Ok(self.take(1)?[0])
    }

    fn read_u32(&mut self) -> Result<u32, CodecError> {
        let bytes = self.take(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn read_f64(&mut self) -> Result<f64, CodecError> {
        let bytes = self.take(8)?;
        let mut arr = [0u8; 8];
        arr.copy_from_slice(bytes);
        Ok(f64::from_le_bytes(arr))
    }

    fn read_string(&mut self) -> Result<String, CodecError> {
        let len = self.read_u32()? as usize;
        let offset = self.pos;
        let bytes = self.take(len)?;
        match std::str::from_utf8(bytes) {
            Ok(s) => Ok(s.to_string()),
            Err(_) => Err(CodecError::InvalidUtf8 { offset }),
        }
    }

    fn read_point(&mut self) -> Result<Point, CodecError> {
        let x = self.read_f64()?;
        let y = self.read_f64()?;
        Ok(Point { x, y })
    }

    fn read_quad(&mut self) -> Result<GeometryQuad, CodecError> {
        let top_left = self.read_point()?;
        let top_right = self.read_point()?;
        let bottom_left = self.read_point()?;
        let bottom_right = self.read_point()?;
        Ok(GeometryQuad {
            top_left,
            top_right,
            bottom_left,
            bottom_right,
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
