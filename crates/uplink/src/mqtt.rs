//! MQTT Uplink Transport

use async_trait::async_trait;
use rumqttc::{AsyncClient, Event, MqttOptions, QoS};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::error::UplinkError;
use crate::{Uplink, MAX_PAYLOAD_BYTES};

/// Visibility scope of published batches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Private,
    Public,
}

impl Visibility {
    fn as_topic_segment(&self) -> &'static str {
        match self {
            Visibility::Private => "private",
            Visibility::Public => "public",
        }
    }
}

/// Uplink configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UplinkConfig {
    /// MQTT broker host
    pub broker_url: String,
    /// MQTT port
    pub broker_port: u16,
    /// Device identity, used for the client id and topic
    pub device_id: String,
    /// Topic the batches are published under
    pub topic: String,
    /// Advisory time-to-live for a batch, enforced broker-side
    pub ttl_secs: u32,
    /// Visibility scope, published as a topic segment
    pub visibility: Visibility,
}

impl Default for UplinkConfig {
    fn default() -> Self {
        Self {
            broker_url: "localhost".to_string(),
            broker_port: 1883,
            device_id: "unknown".to_string(),
            topic: "frames".to_string(),
            ttl_secs: 60,
            visibility: Visibility::Private,
        }
    }
}

/// MQTT-backed uplink.
///
/// Batches are published at most once; a failed publish is surfaced to the
/// caller and never retried here.
pub struct MqttUplink {
    config: UplinkConfig,
    client: Option<AsyncClient>,
}

impl MqttUplink {
    pub fn new(config: UplinkConfig) -> Self {
        Self {
            config,
            client: None,
        }
    }

    /// Connect to the broker and start draining its event loop.
    pub async fn connect(&mut self) -> Result<(), UplinkError> {
        let mut options = MqttOptions::new(
            format!("vehicle-{}", self.config.device_id),
            &self.config.broker_url,
            self.config.broker_port,
        );
        options.set_keep_alive(std::time::Duration::from_secs(30));

        let (client, mut eventloop) = AsyncClient::new(options, 10);

        tokio::spawn(async move {
            loop {
                match eventloop.poll().await {
                    Ok(Event::Incoming(incoming)) => {
                        debug!("MQTT incoming: {:?}", incoming);
                    }
                    Err(e) => {
                        error!("MQTT error: {}", e);
                        tokio::time::sleep(std::time::Duration::from_secs(5)).await;
                    }
                    _ => {}
                }
            }
        });

        self.client = Some(client);
        info!("Connected to MQTT broker: {}", self.config.broker_url);
        Ok(())
    }

    /// Topic path batches are published under.
    pub fn topic(&self) -> String {
        format!(
            "vehicles/{}/{}/{}",
            self.config.device_id,
            self.config.visibility.as_topic_segment(),
            self.config.topic,
        )
    }
}

#[async_trait]
impl Uplink for MqttUplink {
    async fn publish(&self, payload: &str) -> Result<(), UplinkError> {
        if payload.len() > MAX_PAYLOAD_BYTES {
            return Err(UplinkError::PayloadTooLarge {
                len: payload.len(),
                max: MAX_PAYLOAD_BYTES,
            });
        }

        let client = self.client.as_ref().ok_or(UplinkError::NotConnected)?;

        let topic = self.topic();
        debug!(
            topic = %topic,
            bytes = payload.len(),
            ttl_secs = self.config.ttl_secs,
            "publishing batch"
        );

        client
            .publish(&topic, QoS::AtMostOnce, false, payload.as_bytes().to_vec())
            .await
            .map_err(|e| UplinkError::Unavailable(e.to_string()))
    }
}
