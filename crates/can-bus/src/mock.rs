//! In-memory bus for tests and hardware-free operation.

use std::collections::VecDeque;

use crate::{CanBus, CanBusError, CanFrame};

/// A scripted bus: received frames are queued ahead of time, transmitted
/// frames are recorded for inspection.
#[derive(Debug, Default)]
pub struct MockBus {
    rx: VecDeque<CanFrame>,
    sent: Vec<CanFrame>,
    fail_transmit: bool,
}

impl MockBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a frame to be handed out by `try_recv`.
    pub fn queue_frame(&mut self, frame: CanFrame) {
        self.rx.push_back(frame);
    }

    /// Make every following `transmit` fail.
    pub fn set_transmit_failure(&mut self, fail: bool) {
        self.fail_transmit = fail;
    }

    /// Frames transmitted so far, oldest first.
    pub fn sent(&self) -> &[CanFrame] {
        &self.sent
    }
}

impl CanBus for MockBus {
    fn transmit(&mut self, frame: &CanFrame) -> Result<(), CanBusError> {
        if self.fail_transmit {
            return Err(CanBusError::Transmit("mock bus offline".to_string()));
        }
        self.sent.push(*frame);
        Ok(())
    }

    fn try_recv(&mut self) -> Option<CanFrame> {
        self.rx.pop_front()
    }
}
