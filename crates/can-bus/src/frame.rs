//! Classic CAN Frame

use crate::error::CanBusError;

/// Maximum payload of a classic CAN frame.
pub const MAX_PAYLOAD: usize = 8;

/// Largest 11-bit standard identifier.
pub const MAX_STANDARD_ID: u16 = 0x7FF;

/// A classic CAN frame with an 11-bit identifier and up to 8 payload bytes.
///
/// Frames are only built through [`CanFrame::new`], so the identifier and
/// length invariants hold for every value in circulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanFrame {
    id: u16,
    len: u8,
    data: [u8; MAX_PAYLOAD],
}

impl CanFrame {
    /// Create a frame, validating the identifier and payload length.
    pub fn new(id: u16, payload: &[u8]) -> Result<Self, CanBusError> {
        if id > MAX_STANDARD_ID {
            return Err(CanBusError::InvalidId(id));
        }
        if payload.len() > MAX_PAYLOAD {
            return Err(CanBusError::PayloadTooLong(payload.len()));
        }
        let mut data = [0u8; MAX_PAYLOAD];
        data[..payload.len()].copy_from_slice(payload);
        Ok(Self {
            id,
            len: payload.len() as u8,
            data,
        })
    }

    /// Frame identifier.
    pub fn id(&self) -> u16 {
        self.id
    }

    /// Number of payload bytes carried.
    pub fn len(&self) -> usize {
        self.len as usize
    }

    /// True for a frame with no payload.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Payload bytes actually carried by the frame.
    pub fn payload(&self) -> &[u8] {
        &self.data[..self.len as usize]
    }
}
