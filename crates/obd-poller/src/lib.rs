//! OBD-II Poller
//!
//! Drives a three-state timed cycle per PID: send one mode-01 request,
//! drain all bus traffic while waiting for the reply, cool down, repeat
//! with the next PID in rotation. A missed reply costs one PID's worth of
//! data and never blocks the schedule.

mod error;
mod machine;
mod schedule;

pub use error::PollerError;
pub use machine::{
    ObdPoller, PollState, PollTiming, FUNCTIONAL_REQUEST_ID, REPLY_ID_CEILING, REPLY_ID_FLOOR,
};
pub use schedule::PidRotation;

/// OBD-II service (mode) constants
pub mod mode {
    /// Current data
    pub const CURRENT_DATA: u8 = 0x01;
}

/// Mode-01 PIDs commonly polled
pub mod pid {
    pub const ENGINE_COOLANT_TEMP: u8 = 0x05;
    pub const ENGINE_RPM: u8 = 0x0C;
    pub const VEHICLE_SPEED: u8 = 0x0D;
    pub const MAF_SENSOR: u8 = 0x10;
    pub const THROTTLE: u8 = 0x11;
    pub const O2_VOLTAGE: u8 = 0x14;
}
