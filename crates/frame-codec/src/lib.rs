//! Frame Codec and Dedup Filter
//!
//! Turns captured CAN frames into compact text records sized for a narrow
//! uplink, and suppresses repeats of one high-rate periodic status frame.

mod codec;
mod dedup;
mod error;

pub use codec::{FrameCodec, ParsedRecord, RecordFormat, DEFAULT_REPLY_FLOOR};
pub use dedup::{DedupFilter, DEFAULT_WATCHED_ID};
pub use error::CodecError;
