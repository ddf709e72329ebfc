//! OBD-II Telemetry Agent - Main Entry Point

mod config;
mod sim;

use std::time::Duration;

use can_bus::CanBus;
use capture::CapturePipeline;
use frame_codec::{DedupFilter, FrameCodec};
use obd_poller::{ObdPoller, PidRotation, PollTiming};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;
use uplink::{MqttUplink, Uplink, UplinkError};

use crate::config::AgentConfig;
use crate::sim::SimulatedBus;

fn init_logging() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

/// One drive-loop tick: poll the current state, then publish whatever
/// batches came due. Bus faults are logged and the schedule carries on;
/// a transient failure never brings the capture loop down.
async fn poll_and_publish<U: Uplink>(
    poller: &mut ObdPoller,
    bus: &mut dyn CanBus,
    pipeline: &mut CapturePipeline,
    uplink: &U,
    batches_published: &mut u64,
) {
    if let Err(e) = poller.step(bus, pipeline) {
        warn!(error = %e, "poll step failed, continuing");
        return;
    }
    while let Some(batch) = pipeline.next_batch() {
        match uplink.publish(&batch).await {
            Ok(()) => *batches_published += 1,
            Err(UplinkError::PayloadTooLarge { len, max }) => {
                // retrying cannot shrink it
                warn!(len, max, "batch exceeds uplink ceiling, dropping");
            }
            Err(e) => {
                warn!(error = %e, "uplink publish failed");
                pipeline.requeue(batch);
                break;
            }
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    info!("=== OBD telemetry agent v{} ===", env!("CARGO_PKG_VERSION"));

    let config_path = std::env::args().nth(1);
    let cfg = AgentConfig::load(config_path.as_deref())?;

    let rotation = PidRotation::new(cfg.pids.clone())?;
    info!(
        pids = rotation.len(),
        cooldown_ms = cfg.cooldown_ms,
        "polling {} PIDs in rotation",
        rotation.len()
    );

    let timing = PollTiming {
        reply_timeout: Duration::from_millis(cfg.reply_timeout_ms),
        cooldown: Duration::from_millis(cfg.cooldown_ms),
    };
    let mut poller = ObdPoller::new(rotation, timing)
        .with_request_id(cfg.request_id)
        .with_reply_band(cfg.reply_floor..=cfg.reply_ceiling);
    let mut pipeline = CapturePipeline::new(
        DedupFilter::new(cfg.watched_id),
        FrameCodec::new(cfg.record_format, cfg.reply_floor),
        cfg.flush,
    );
    let mut bus = SimulatedBus::new();

    let mut mqtt = MqttUplink::new(cfg.uplink.clone());
    if let Err(e) = mqtt.connect().await {
        // batches are retried from the pipeline backlog once the broker
        // comes up
        warn!(error = %e, "uplink connect failed, continuing without it");
    }

    let mut tick = tokio::time::interval(Duration::from_millis(cfg.poll_interval_ms));
    let mut status = tokio::time::interval(Duration::from_secs(cfg.status_interval_secs));
    let mut batches_published: u64 = 0;

    loop {
        tokio::select! {
            _ = tick.tick() => {
                poll_and_publish(
                    &mut poller,
                    &mut bus,
                    &mut pipeline,
                    &mqtt,
                    &mut batches_published,
                )
                .await;
            }
            _ = status.tick() => {
                info!(
                    frames = poller.frames_seen(),
                    batches = batches_published,
                    backlog = pipeline.ready_batches(),
                    indicator = poller.indicator(),
                    "capture status"
                );
            }
        }
    }
}
