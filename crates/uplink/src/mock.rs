//! In-memory uplink for tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::UplinkError;
use crate::{Uplink, MAX_PAYLOAD_BYTES};

/// Records published batches; can be switched to fail.
#[derive(Debug, Default)]
pub struct MockUplink {
    published: Mutex<Vec<String>>,
    unavailable: AtomicBool,
}

impl MockUplink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following publish fail with `Unavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::Relaxed);
    }

    /// Batches published so far, oldest first.
    pub fn published(&self) -> Vec<String> {
        self.published.lock().expect("mock lock poisoned").clone()
    }
}

#[async_trait]
impl Uplink for MockUplink {
    async fn publish(&self, payload: &str) -> Result<(), UplinkError> {
        if payload.len() > MAX_PAYLOAD_BYTES {
            return Err(UplinkError::PayloadTooLarge {
                len: payload.len(),
                max: MAX_PAYLOAD_BYTES,
            });
        }
        if self.unavailable.load(Ordering::Relaxed) {
            return Err(UplinkError::Unavailable("mock offline".to_string()));
        }
        self.published
            .lock()
            .expect("mock lock poisoned")
            .push(payload.to_string());
        Ok(())
    }
}
