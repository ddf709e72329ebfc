//! Threshold-Flushed Text Accumulator

use serde::{Deserialize, Serialize};

/// Default character threshold, tuned to stay under the ~255 byte uplink
/// payload ceiling with margin for one more entry.
pub const DEFAULT_MAX_CHARS: usize = 220;

/// Entry-count threshold used by the earlier design.
pub const DEFAULT_MAX_ENTRIES: usize = 9;

/// When the batch buffer hands its contents to the uplink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FlushPolicy {
    /// Flush once this many entries are buffered.
    MaxEntries(usize),
    /// Flush once the buffered text reaches this many characters.
    MaxChars(usize),
}

impl Default for FlushPolicy {
    fn default() -> Self {
        FlushPolicy::MaxChars(DEFAULT_MAX_CHARS)
    }
}

/// Append-only accumulator of encoded frame entries.
///
/// Entries are never split: the threshold is checked after an append, so
/// the buffer may exceed it by at most one entry before it is taken.
#[derive(Debug, Default)]
pub struct BatchBuffer {
    buf: String,
    entries: usize,
    policy: FlushPolicy,
}

impl BatchBuffer {
    pub fn new(policy: FlushPolicy) -> Self {
        Self {
            buf: String::new(),
            entries: 0,
            policy,
        }
    }

    /// Append one complete encoded entry.
    pub fn append(&mut self, entry: &str) {
        self.buf.push_str(entry);
        self.entries += 1;
    }

    /// True once the configured threshold has been reached.
    pub fn should_flush(&self) -> bool {
        match self.policy {
            FlushPolicy::MaxEntries(limit) => self.entries >= limit,
            FlushPolicy::MaxChars(limit) => self.buf.len() >= limit,
        }
    }

    /// Hand over the buffered text, leaving the buffer empty.
    pub fn take(&mut self) -> String {
        self.entries = 0;
        std::mem::take(&mut self.buf)
    }

    /// Buffered text length in characters.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Number of complete entries buffered.
    pub fn entry_count(&self) -> usize {
        self.entries
    }
}
