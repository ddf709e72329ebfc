//! Capture & Batch Buffer
//!
//! Accumulates encoded frame text across poll cycles and hands out
//! uplink-sized batches once a flush threshold is crossed.

mod batch;
mod pipeline;

pub use batch::{BatchBuffer, FlushPolicy, DEFAULT_MAX_CHARS, DEFAULT_MAX_ENTRIES};
pub use pipeline::{CapturePipeline, MAX_READY_BATCHES};
