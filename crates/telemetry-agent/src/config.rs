//! Agent Configuration
//!
//! Layered: optional TOML file, then `AGENT_`-prefixed environment
//! overrides. Defaults match the constants the poller was tuned with.

use capture::FlushPolicy;
use frame_codec::{RecordFormat, DEFAULT_WATCHED_ID};
use obd_poller::{pid, FUNCTIONAL_REQUEST_ID, REPLY_ID_CEILING, REPLY_ID_FLOOR};
use serde::Deserialize;
use uplink::UplinkConfig;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// PIDs polled in rotation
    pub pids: Vec<u8>,
    /// Identifier diagnostic requests are addressed to
    pub request_id: u16,
    /// Lowest ECU reply identifier; also the codec's trimming floor
    pub reply_floor: u16,
    /// Highest ECU reply identifier
    pub reply_ceiling: u16,
    /// How long to drain the bus after each request (ms)
    pub reply_timeout_ms: u64,
    /// Idle gap between cycles (ms); 400 reproduces the early design
    pub cooldown_ms: u64,
    /// Periodic status frame subject to dedup
    pub watched_id: u16,
    /// Wire text format of encoded records
    pub record_format: RecordFormat,
    /// Batch flush threshold
    pub flush: FlushPolicy,
    /// Drive loop poll interval (ms)
    pub poll_interval_ms: u64,
    /// Cadence of the capture status log line (s)
    pub status_interval_secs: u64,
    /// Uplink transport settings
    pub uplink: UplinkConfig,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            pids: vec![
                pid::ENGINE_COOLANT_TEMP,
                pid::ENGINE_RPM,
                pid::VEHICLE_SPEED,
                pid::MAF_SENSOR,
                pid::THROTTLE,
                pid::O2_VOLTAGE,
            ],
            request_id: FUNCTIONAL_REQUEST_ID,
            reply_floor: REPLY_ID_FLOOR,
            reply_ceiling: REPLY_ID_CEILING,
            reply_timeout_ms: 100,
            cooldown_ms: 80,
            watched_id: DEFAULT_WATCHED_ID,
            record_format: RecordFormat::default(),
            flush: FlushPolicy::default(),
            poll_interval_ms: 5,
            status_interval_secs: 20,
            uplink: UplinkConfig::default(),
        }
    }
}

impl AgentConfig {
    /// Load configuration, optionally from an explicit file path.
    pub fn load(path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();
        builder = match path {
            Some(path) => builder.add_source(config::File::with_name(path)),
            None => builder.add_source(config::File::with_name("agent").required(false)),
        };
        builder
            .add_source(config::Environment::with_prefix("AGENT").separator("__"))
            .build()?
            .try_deserialize()
    }
}
