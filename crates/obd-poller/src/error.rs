//! Poller Error Types

use can_bus::CanBusError;
use thiserror::Error;

/// Errors raised by the polling machinery
#[derive(Debug, Error)]
pub enum PollerError {
    /// The PID table must hold at least one entry
    #[error("PID table is empty")]
    EmptyPidTable,

    /// Bus access failed
    #[error(transparent)]
    Bus(#[from] CanBusError),
}
