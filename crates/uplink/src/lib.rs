//! Telemetry Uplink
//!
//! Publishes encoded frame batches over a narrow, size-limited channel.
//! Delivery is fire-and-forget; the poll schedule is never blocked on it.

mod error;
mod mqtt;

pub mod mock;

pub use error::UplinkError;
pub use mqtt::{MqttUplink, UplinkConfig, Visibility};

use async_trait::async_trait;

/// Practical ceiling on one published payload.
pub const MAX_PAYLOAD_BYTES: usize = 255;

/// One-way batch publishing.
#[async_trait]
pub trait Uplink: Send + Sync {
    /// Publish one batch of encoded frames.
    async fn publish(&self, payload: &str) -> Result<(), UplinkError>;
}
