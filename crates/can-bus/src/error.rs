//! CAN Bus Error Types

use thiserror::Error;

/// Errors raised by frame construction and bus access
#[derive(Debug, Clone, Error)]
pub enum CanBusError {
    /// Identifier does not fit in 11 bits
    #[error("identifier 0x{0:X} exceeds the 11-bit standard range")]
    InvalidId(u16),

    /// Payload larger than a classic CAN frame can carry
    #[error("payload of {0} bytes exceeds the 8 byte frame capacity")]
    PayloadTooLong(usize),

    /// Transmit rejected by the bus interface
    #[error("transmit failed: {0}")]
    Transmit(String),
}
