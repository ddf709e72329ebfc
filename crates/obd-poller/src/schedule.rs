//! Round-Robin PID Rotation

use crate::error::PollerError;

/// Round-robin cursor over a fixed, ordered PID table.
///
/// Every PID is queried exactly once per full rotation, in table order,
/// with wraparound. The table is validated non-empty at construction.
#[derive(Debug, Clone)]
pub struct PidRotation {
    pids: Vec<u8>,
    cursor: usize,
}

impl PidRotation {
    pub fn new(pids: Vec<u8>) -> Result<Self, PollerError> {
        if pids.is_empty() {
            return Err(PollerError::EmptyPidTable);
        }
        // start on the last slot so the first call to next() lands on the
        // first table entry
        let cursor = pids.len() - 1;
        Ok(Self { pids, cursor })
    }

    /// Advance one position (wrapping) and return the PID there.
    pub fn next(&mut self) -> u8 {
        self.cursor = (self.cursor + 1) % self.pids.len();
        self.pids[self.cursor]
    }

    /// Number of PIDs in the table.
    pub fn len(&self) -> usize {
        self.pids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pids.is_empty()
    }
}
