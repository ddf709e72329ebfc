//! Dedup → Encode → Batch Pipeline

use std::collections::VecDeque;

use can_bus::CanFrame;
use frame_codec::{DedupFilter, FrameCodec};
use tracing::{trace, warn};

use crate::batch::{BatchBuffer, FlushPolicy};

/// Ceiling on batches awaiting publish. When the uplink stays unavailable
/// the oldest batch is dropped to make room, keeping memory bounded.
pub const MAX_READY_BATCHES: usize = 4;

/// Feeds drained bus frames through dedup and encoding into the batch
/// buffer, and queues full batches for the uplink.
pub struct CapturePipeline {
    dedup: DedupFilter,
    codec: FrameCodec,
    batch: BatchBuffer,
    ready: VecDeque<String>,
}

impl CapturePipeline {
    pub fn new(dedup: DedupFilter, codec: FrameCodec, policy: FlushPolicy) -> Self {
        Self {
            dedup,
            codec,
            batch: BatchBuffer::new(policy),
            ready: VecDeque::new(),
        }
    }

    /// Process one drained frame. `timestamp` is monotonic seconds since
    /// capture start.
    pub fn capture(&mut self, timestamp: f64, frame: &CanFrame) {
        if !self.dedup.admit(frame) {
            trace!(id = format_args!("0x{:03x}", frame.id()), "suppressed repeat");
            return;
        }
        let entry = match self.codec.encode(timestamp, frame) {
            Ok(entry) => entry,
            Err(err) => {
                warn!(error = %err, "failed to encode frame, skipping");
                return;
            }
        };
        self.batch.append(&entry);
        if self.batch.should_flush() {
            let batch = self.batch.take();
            self.enqueue(batch);
        }
    }

    /// Next batch due for publish, if any.
    pub fn next_batch(&mut self) -> Option<String> {
        self.ready.pop_front()
    }

    /// Put back a batch the uplink could not take. It is retried on the
    /// next publish attempt unless displaced by newer batches.
    pub fn requeue(&mut self, batch: String) {
        self.ready.push_front(batch);
        self.shed();
    }

    /// Entries buffered but not yet batched.
    pub fn pending_entries(&self) -> usize {
        self.batch.entry_count()
    }

    /// Batches waiting for the uplink.
    pub fn ready_batches(&self) -> usize {
        self.ready.len()
    }

    fn enqueue(&mut self, batch: String) {
        self.ready.push_back(batch);
        self.shed();
    }

    fn shed(&mut self) {
        while self.ready.len() > MAX_READY_BATCHES {
            if let Some(dropped) = self.ready.pop_front() {
                warn!(
                    dropped_chars = dropped.len(),
                    "uplink backlog full, dropping oldest batch"
                );
            }
        }
    }
}
