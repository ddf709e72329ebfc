//! Change-Based Suppression for the Periodic Status Frame

use can_bus::{CanFrame, MAX_PAYLOAD};

/// Default identifier of the high-rate periodic status frame.
pub const DEFAULT_WATCHED_ID: u16 = 0x130;

/// Suppresses repeated payloads of one watched identifier.
///
/// The vehicle emits the watched frame at a fixed high rate with mostly
/// unchanged content; only changes are worth uplink budget. The cache
/// starts with no prior observation, so the very first payload is always
/// admitted even when it is all zeroes.
#[derive(Debug)]
pub struct DedupFilter {
    watched_id: u16,
    last_seen: Option<(u8, [u8; MAX_PAYLOAD])>,
}

impl DedupFilter {
    pub fn new(watched_id: u16) -> Self {
        Self {
            watched_id,
            last_seen: None,
        }
    }

    /// Identifier subject to suppression.
    pub fn watched_id(&self) -> u16 {
        self.watched_id
    }

    /// Whether the frame should be encoded. Frames with other identifiers
    /// always pass.
    pub fn admit(&mut self, frame: &CanFrame) -> bool {
        if frame.id() != self.watched_id {
            return true;
        }
        let mut data = [0u8; MAX_PAYLOAD];
        data[..frame.len()].copy_from_slice(frame.payload());
        let observed = (frame.len() as u8, data);
        if self.last_seen == Some(observed) {
            return false;
        }
        self.last_seen = Some(observed);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(payload: &[u8]) -> CanFrame {
        CanFrame::new(DEFAULT_WATCHED_ID, payload).unwrap()
    }

    #[test]
    fn repeated_payload_is_suppressed() {
        let mut filter = DedupFilter::new(DEFAULT_WATCHED_ID);
        assert!(filter.admit(&status(&[0x45, 0x02])));
        assert!(!filter.admit(&status(&[0x45, 0x02])));
        assert!(!filter.admit(&status(&[0x45, 0x02])));
    }

    #[test]
    fn changed_payload_passes() {
        let mut filter = DedupFilter::new(DEFAULT_WATCHED_ID);
        assert!(filter.admit(&status(&[0x45, 0x02])));
        assert!(filter.admit(&status(&[0x45, 0x03])));
    }

    #[test]
    fn first_all_zero_payload_is_admitted() {
        // no prior observation sentinel: an initial all-zero payload must
        // not be mistaken for a repeat
        let mut filter = DedupFilter::new(DEFAULT_WATCHED_ID);
        assert!(filter.admit(&status(&[0x00; 8])));
        assert!(!filter.admit(&status(&[0x00; 8])));
    }

    #[test]
    fn length_change_is_a_change() {
        let mut filter = DedupFilter::new(DEFAULT_WATCHED_ID);
        assert!(filter.admit(&status(&[0x45, 0x02])));
        assert!(filter.admit(&status(&[0x45, 0x02, 0x00])));
    }

    #[test]
    fn other_identifiers_always_pass() {
        let mut filter = DedupFilter::new(DEFAULT_WATCHED_ID);
        let other = CanFrame::new(0x7E8, &[0x04, 0x41, 0x0C, 0x1A]).unwrap();
        assert!(filter.admit(&other));
        assert!(filter.admit(&other));
    }
}
