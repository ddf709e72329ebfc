//! Uplink Error Types

use thiserror::Error;

/// Errors during batch publishing
#[derive(Debug, Error)]
pub enum UplinkError {
    /// Broker rejected or never received the publish
    #[error("uplink unavailable: {0}")]
    Unavailable(String),

    /// Payload exceeds the transport ceiling
    #[error("payload of {len} bytes exceeds the {max} byte ceiling")]
    PayloadTooLarge { len: usize, max: usize },

    /// Publish attempted before connecting
    #[error("uplink not connected")]
    NotConnected,
}
