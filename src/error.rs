use thiserror::Error;

/// Errors that can occur when decoding a persisted detection envelope.
///
/// Encoding is infallible for well-formed in-memory values; every variant
/// here is produced by the decode path.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CodecError {
    /// Input ended before a field could be read
    #[error("unexpected end of input: need {needed} more bytes at offset {offset}")]
    UnexpectedEof { offset: usize, needed: usize },

    /// Envelope carries a version this build does not understand
    #[error("unsupported envelope version: {0}")]
    UnsupportedVersion(u8),

    /// Detection record has an unknown discriminator byte
    #[error("unknown detection discriminator: {0}")]
    UnknownDiscriminator(u8),

    /// A string field does not contain valid UTF-8
    #[error("invalid UTF-8 in string field at offset {offset}")]
    InvalidUtf8 { offset: usize },

    /// Word offsets violate `0 <= start <= end <= codepoint_len(text)`
    #[error("invalid word range {start}..{end} for text of {len} codepoints")]
    InvalidWordRange { start: u32, end: u32, len: u32 },

    /// Bytes remain after the declared record count was consumed
    #[error("trailing bytes after envelope: {0}")]
    TrailingBytes(usize),
}

/// Errors reported by the durable transactional item store.
///
/// Store failures never surface to recognition callers; the cache layer
/// degrades them to misses or skipped writes and logs them.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// Backend rejected or failed the operation
    #[error("store backend error: {0}")]
    Backend(String),

    /// The store's transaction could not be committed
    #[error("store transaction failed: {0}")]
    Transaction(String),
}

/// Errors reported by a recognition engine subtask.
///
/// A failing detector contributes an empty result list; it never aborts
/// the other detector or the overall lookup.
#[derive(Debug, Clone, Error)]
pub enum EngineError {
    /// One detection pass failed
    #[error("detector failure: {0}")]
    Detector(String),
}
