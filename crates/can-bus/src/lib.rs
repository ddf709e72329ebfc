//! CAN Bus Access
//!
//! Provides the fixed-capacity CAN frame type and the non-blocking bus
//! trait the OBD-II poller drives.

mod error;
mod frame;

pub mod mock;

pub use error::CanBusError;
pub use frame::{CanFrame, MAX_PAYLOAD, MAX_STANDARD_ID};

/// Non-blocking access to a CAN bus.
///
/// Both operations return immediately whether or not work was available.
/// Waiting is modeled by the caller polling again.
pub trait CanBus {
    /// Transmit one frame.
    fn transmit(&mut self, frame: &CanFrame) -> Result<(), CanBusError>;

    /// Take the next buffered frame, if any.
    fn try_recv(&mut self) -> Option<CanFrame>;
}
