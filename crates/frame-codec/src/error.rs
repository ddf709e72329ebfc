//! Codec Error Types

use thiserror::Error;

/// Errors during record encoding and parsing
#[derive(Debug, Error)]
pub enum CodecError {
    /// Record does not end with the entry separator
    #[error("record is missing its trailing separator")]
    MissingTerminator,

    /// Record has no timestamp/payload separator
    #[error("record is missing the ':' separator")]
    MissingSeparator,

    /// Timestamp field failed to parse
    #[error("invalid timestamp field: {0:?}")]
    BadTimestamp(String),

    /// Hex payload is not a sequence of byte pairs
    #[error("invalid hex payload: {0:?}")]
    BadHex(String),

    /// JSON record serialization failed
    #[error("json encoding failed: {0}")]
    Json(#[from] serde_json::Error),
}
