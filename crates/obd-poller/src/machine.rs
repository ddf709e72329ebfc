//! Request/Response State Machine

use std::ops::RangeInclusive;
use std::time::Duration;

use can_bus::{CanBus, CanFrame};
use capture::CapturePipeline;
use tokio::time::Instant;
use tracing::{debug, trace};

use crate::error::PollerError;
use crate::mode;
use crate::schedule::PidRotation;

/// Functional (broadcast) diagnostic request identifier.
pub const FUNCTIONAL_REQUEST_ID: u16 = 0x7DF;

/// ECU reply identifier band.
pub const REPLY_ID_FLOOR: u16 = 0x7E8;
pub const REPLY_ID_CEILING: u16 = 0x7EF;

/// The three states of the query cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    /// Send the next request; leaves immediately.
    Querying,
    /// Drain bus traffic until the reply timeout.
    AwaitingReply,
    /// Idle gap before the next request.
    Cooldown,
}

/// Timing of the query cycle, gated against a monotonic clock.
#[derive(Debug, Clone, Copy)]
pub struct PollTiming {
    /// How long to keep draining the bus after a request.
    pub reply_timeout: Duration,
    /// Idle gap before the next request. The indicator is lowered at the
    /// midpoint.
    pub cooldown: Duration,
}

impl Default for PollTiming {
    fn default() -> Self {
        Self {
            reply_timeout: Duration::from_millis(100),
            cooldown: Duration::from_millis(80),
        }
    }
}

/// Drives the query → listen → cooldown cycle.
///
/// `step` never suspends: every call does whatever the current state
/// allows and returns. All timing comes from re-entry across many calls.
pub struct ObdPoller {
    rotation: PidRotation,
    timing: PollTiming,
    request_id: u16,
    reply_band: RangeInclusive<u16>,
    state: PollState,
    transitioned_at: Instant,
    started_at: Instant,
    current_pid: u8,
    reply_seen: bool,
    indicator: bool,
    frames_seen: u64,
}

impl ObdPoller {
    pub fn new(rotation: PidRotation, timing: PollTiming) -> Self {
        let now = Instant::now();
        Self {
            rotation,
            timing,
            request_id: FUNCTIONAL_REQUEST_ID,
            reply_band: REPLY_ID_FLOOR..=REPLY_ID_CEILING,
            state: PollState::Querying,
            transitioned_at: now,
            started_at: now,
            current_pid: 0,
            reply_seen: false,
            indicator: false,
            frames_seen: 0,
        }
    }

    /// Address requests to a specific identifier instead of the broadcast
    /// functional id.
    pub fn with_request_id(mut self, request_id: u16) -> Self {
        self.request_id = request_id;
        self
    }

    /// Override the ECU reply identifier band.
    pub fn with_reply_band(mut self, band: RangeInclusive<u16>) -> Self {
        self.reply_band = band;
        self
    }

    pub fn state(&self) -> PollState {
        self.state
    }

    /// PID of the outstanding (or most recent) request.
    pub fn current_pid(&self) -> u8 {
        self.current_pid
    }

    /// Whether the awaited reply arrived within the current cycle.
    pub fn reply_seen(&self) -> bool {
        self.reply_seen
    }

    /// Visual indicator: raised on a recognized reply, lowered after the
    /// cooldown midpoint. Cosmetic only.
    pub fn indicator(&self) -> bool {
        self.indicator
    }

    /// Total frames drained off the bus.
    pub fn frames_seen(&self) -> u64 {
        self.frames_seen
    }

    /// Run one poll of the current state.
    pub fn step(
        &mut self,
        bus: &mut dyn CanBus,
        pipeline: &mut CapturePipeline,
    ) -> Result<(), PollerError> {
        match self.state {
            PollState::Querying => {
                let pid = self.rotation.next();
                self.current_pid = pid;
                self.reply_seen = false;
                let request = CanFrame::new(
                    self.request_id,
                    &[0x02, mode::CURRENT_DATA, pid, 0, 0, 0, 0, 0],
                )?;
                bus.transmit(&request)?;
                trace!(pid = format_args!("0x{pid:02X}"), "sent diagnostic request");
                self.transition(PollState::AwaitingReply);
            }
            PollState::AwaitingReply => {
                // drain everything, not just the awaited reply: the bus
                // carries unsolicited broadcast traffic worth capturing
                while let Some(frame) = bus.try_recv() {
                    self.frames_seen += 1;
                    if self.is_awaited_reply(&frame) {
                        self.reply_seen = true;
                        self.indicator = true;
                        debug!(
                            id = format_args!("0x{:03X}", frame.id()),
                            pid = format_args!("0x{:02X}", self.current_pid),
                            "reply recognized"
                        );
                    }
                    pipeline.capture(self.elapsed_secs(), &frame);
                }
                if self.transitioned_at.elapsed() >= self.timing.reply_timeout {
                    self.transition(PollState::Cooldown);
                }
            }
            PollState::Cooldown => {
                let elapsed = self.transitioned_at.elapsed();
                if elapsed >= self.timing.cooldown {
                    self.transition(PollState::Querying);
                } else if elapsed >= self.timing.cooldown / 2 {
                    self.indicator = false;
                }
            }
        }
        Ok(())
    }

    fn transition(&mut self, next: PollState) {
        self.state = next;
        self.transitioned_at = Instant::now();
    }

    /// Monotonic seconds since the poller started, used as the capture
    /// timestamp.
    fn elapsed_secs(&self) -> f64 {
        self.started_at.elapsed().as_secs_f64()
    }

    fn is_awaited_reply(&self, frame: &CanFrame) -> bool {
        self.reply_band.contains(&frame.id())
            && frame.payload().get(2) == Some(&self.current_pid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use can_bus::mock::MockBus;
    use capture::FlushPolicy;
    use frame_codec::{DedupFilter, FrameCodec, RecordFormat};
    use tokio::time::advance;

    fn test_pipeline() -> CapturePipeline {
        CapturePipeline::new(
            DedupFilter::new(0x130),
            FrameCodec::new(RecordFormat::HexCompact, REPLY_ID_FLOOR),
            FlushPolicy::MaxChars(10_000),
        )
    }

    fn poller(pids: &[u8]) -> ObdPoller {
        ObdPoller::new(PidRotation::new(pids.to_vec()).unwrap(), PollTiming::default())
    }

    #[tokio::test(start_paused = true)]
    async fn query_sends_padded_mode01_request() {
        let mut bus = MockBus::new();
        let mut pipeline = test_pipeline();
        let mut p = poller(&[0x05, 0x0C]);

        p.step(&mut bus, &mut pipeline).unwrap();

        let sent = bus.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].id(), FUNCTIONAL_REQUEST_ID);
        assert_eq!(sent[0].payload(), &[0x02, 0x01, 0x05, 0, 0, 0, 0, 0]);
        assert_eq!(p.current_pid(), 0x05);
    }

    #[tokio::test(start_paused = true)]
    async fn cycle_follows_query_listen_cooldown_order() {
        let mut bus = MockBus::new();
        let mut pipeline = test_pipeline();
        let mut p = poller(&[0x05, 0x0C]);

        assert_eq!(p.state(), PollState::Querying);
        p.step(&mut bus, &mut pipeline).unwrap();
        assert_eq!(p.state(), PollState::AwaitingReply);

        // never leaves the listen state early
        advance(Duration::from_millis(99)).await;
        p.step(&mut bus, &mut pipeline).unwrap();
        assert_eq!(p.state(), PollState::AwaitingReply);

        advance(Duration::from_millis(1)).await;
        p.step(&mut bus, &mut pipeline).unwrap();
        assert_eq!(p.state(), PollState::Cooldown);

        // never leaves cooldown early
        advance(Duration::from_millis(79)).await;
        p.step(&mut bus, &mut pipeline).unwrap();
        assert_eq!(p.state(), PollState::Cooldown);

        advance(Duration::from_millis(1)).await;
        p.step(&mut bus, &mut pipeline).unwrap();
        assert_eq!(p.state(), PollState::Querying);

        // next cycle queries the next PID in rotation
        p.step(&mut bus, &mut pipeline).unwrap();
        assert_eq!(p.current_pid(), 0x0C);
    }

    #[tokio::test(start_paused = true)]
    async fn recognizes_reply_and_raises_indicator() {
        let mut bus = MockBus::new();
        let mut pipeline = test_pipeline();
        let mut p = poller(&[0x05, 0x0C]);

        // request 0x05, let the cycle pass without a reply
        p.step(&mut bus, &mut pipeline).unwrap();
        advance(Duration::from_millis(100)).await;
        p.step(&mut bus, &mut pipeline).unwrap();
        advance(Duration::from_millis(80)).await;
        p.step(&mut bus, &mut pipeline).unwrap();
        assert!(!p.reply_seen());

        // request 0x0C and answer it within the timeout
        p.step(&mut bus, &mut pipeline).unwrap();
        assert_eq!(p.current_pid(), 0x0C);
        bus.queue_frame(
            CanFrame::new(0x7E8, &[0x04, 0x41, 0x0C, 0x1A, 0x00, 0, 0, 0]).unwrap(),
        );
        p.step(&mut bus, &mut pipeline).unwrap();
        assert!(p.reply_seen());
        assert!(p.indicator());
    }

    #[tokio::test(start_paused = true)]
    async fn reply_for_wrong_pid_is_not_recognized() {
        let mut bus = MockBus::new();
        let mut pipeline = test_pipeline();
        let mut p = poller(&[0x0C]);

        p.step(&mut bus, &mut pipeline).unwrap();
        bus.queue_frame(
            CanFrame::new(0x7E8, &[0x04, 0x41, 0x0D, 0x55, 0x00, 0, 0, 0]).unwrap(),
        );
        p.step(&mut bus, &mut pipeline).unwrap();
        assert!(!p.reply_seen());
        // captured anyway
        assert_eq!(p.frames_seen(), 1);
        assert_eq!(pipeline.pending_entries(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn unsolicited_traffic_is_captured_while_listening() {
        let mut bus = MockBus::new();
        let mut pipeline = test_pipeline();
        let mut p = poller(&[0x0C]);

        p.step(&mut bus, &mut pipeline).unwrap();
        bus.queue_frame(CanFrame::new(0x130, &[0x45, 0x02]).unwrap());
        bus.queue_frame(CanFrame::new(0x130, &[0x45, 0x02]).unwrap());
        bus.queue_frame(CanFrame::new(0x2A0, &[0x11]).unwrap());
        p.step(&mut bus, &mut pipeline).unwrap();

        assert_eq!(p.frames_seen(), 3);
        // the repeated status frame was deduplicated
        assert_eq!(pipeline.pending_entries(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn indicator_is_lowered_after_cooldown_midpoint() {
        let mut bus = MockBus::new();
        let mut pipeline = test_pipeline();
        let mut p = poller(&[0x0C]);

        p.step(&mut bus, &mut pipeline).unwrap();
        bus.queue_frame(
            CanFrame::new(0x7E8, &[0x04, 0x41, 0x0C, 0x1A, 0x00, 0, 0, 0]).unwrap(),
        );
        p.step(&mut bus, &mut pipeline).unwrap();
        assert!(p.indicator());

        advance(Duration::from_millis(100)).await;
        p.step(&mut bus, &mut pipeline).unwrap();
        assert_eq!(p.state(), PollState::Cooldown);
        assert!(p.indicator());

        // before the midpoint the indicator stays up
        advance(Duration::from_millis(39)).await;
        p.step(&mut bus, &mut pipeline).unwrap();
        assert!(p.indicator());

        advance(Duration::from_millis(1)).await;
        p.step(&mut bus, &mut pipeline).unwrap();
        assert!(!p.indicator());
        assert_eq!(p.state(), PollState::Cooldown);
    }

    #[tokio::test(start_paused = true)]
    async fn missed_reply_advances_to_the_next_pid() {
        let mut bus = MockBus::new();
        let mut pipeline = test_pipeline();
        let mut p = poller(&[0x05, 0x0C, 0x0D]);

        for expected in [0x05u8, 0x0C, 0x0D, 0x05] {
            p.step(&mut bus, &mut pipeline).unwrap();
            assert_eq!(p.current_pid(), expected);
            advance(Duration::from_millis(100)).await;
            p.step(&mut bus, &mut pipeline).unwrap();
            advance(Duration::from_millis(80)).await;
            p.step(&mut bus, &mut pipeline).unwrap();
            assert_eq!(p.state(), PollState::Querying);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn custom_addressing_overrides_the_defaults() {
        let mut bus = MockBus::new();
        let mut pipeline = test_pipeline();
        let mut p = poller(&[0x0C])
            .with_request_id(0x700)
            .with_reply_band(0x708..=0x70F);

        p.step(&mut bus, &mut pipeline).unwrap();
        assert_eq!(bus.sent()[0].id(), 0x700);

        // a frame in the default band is no longer a reply
        bus.queue_frame(
            CanFrame::new(0x7E8, &[0x04, 0x41, 0x0C, 0x1A, 0x00, 0, 0, 0]).unwrap(),
        );
        p.step(&mut bus, &mut pipeline).unwrap();
        assert!(!p.reply_seen());

        bus.queue_frame(
            CanFrame::new(0x708, &[0x04, 0x41, 0x0C, 0x1A, 0x00, 0, 0, 0]).unwrap(),
        );
        p.step(&mut bus, &mut pipeline).unwrap();
        assert!(p.reply_seen());
    }

    #[tokio::test(start_paused = true)]
    async fn transmit_failure_surfaces_as_bus_error() {
        let mut bus = MockBus::new();
        bus.set_transmit_failure(true);
        let mut pipeline = test_pipeline();
        let mut p = poller(&[0x0C]);

        assert!(matches!(
            p.step(&mut bus, &mut pipeline),
            Err(PollerError::Bus(_))
        ));
    }
}
