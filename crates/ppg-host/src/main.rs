//! PPG heart-rate demo: simulated camera -> heart rate service -> log

use anyhow::Context;
use ppg_host::{HeartRateService, ServiceCommand};
use ppg_processing::PulseConfig;
use ppg_simulation::{ContactSchedule, RealTimeFrameStream, SimulatorConfig, StreamCommand, StreamConfig};
use tokio::sync::broadcast;
use tokio::time::{sleep, Duration};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_RUN_SECONDS: u64 = 30;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => load_config(&path)?,
        None => PulseConfig::standard(),
    };
    let run_seconds = match args.next() {
        Some(value) => value
            .parse::<u64>()
            .with_context(|| format!("invalid run duration {:?}", value))?,
        None => DEFAULT_RUN_SECONDS,
    };

    info!(config = %config.name, run_seconds, "starting heart rate demo");

    // Finger lifted for two seconds midway to show the reset path
    let lift_at = run_seconds as f64 * 0.6;
    let stream = RealTimeFrameStream::new(StreamConfig {
        simulator: SimulatorConfig {
            frame_rate_hz: config.filter.frame_rate_hz,
            contact: ContactSchedule::LiftedBetween {
                start_s: lift_at,
                end_s: lift_at + 2.0,
            },
            drop_probability: 0.01,
            ..SimulatorConfig::default()
        },
        ..StreamConfig::default()
    })?;

    let service = HeartRateService::new(stream.subscribe(), config)?;
    let mut results = service.subscribe_output();
    let stream_control = stream.control_handle();
    let service_control = service.command_handle();
    let stats = service.stats_handle();

    let stream_task = tokio::spawn(stream.run());
    let service_task = tokio::spawn(service.run());

    service_control.send(ServiceCommand::Start).await?;
    stream_control.send(StreamCommand::Start).await?;

    let deadline = sleep(Duration::from_secs(run_seconds));
    tokio::pin!(deadline);

    let mut last_bpm = 0;
    let mut last_mode = None;
    loop {
        tokio::select! {
            _ = &mut deadline => break,
            result = results.recv() => match result {
                Ok(result) => {
                    if last_mode != Some(result.mode) {
                        info!(state = %result.mode, count = result.valid_frame_count, "session state");
                        last_mode = Some(result.mode);
                    }
                    if result.bpm != last_bpm {
                        info!(bpm = result.bpm, count = result.valid_frame_count, "heart rate");
                        last_bpm = result.bpm;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "result consumer lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }

    stream_control.send(StreamCommand::Stop).await?;
    let summary = stats.lock().await.clone();
    info!(
        frames = summary.frames_processed,
        dropped = summary.frames_dropped,
        average_latency_us = summary.average_latency_us,
        bpm = summary.last_bpm,
        "demo finished"
    );

    service_control.send(ServiceCommand::Stop).await?;
    drop(stream_control);
    drop(service_control);

    stream_task.await?.context("frame stream failed")?;
    service_task.await?.context("heart rate service failed")?;
    Ok(())
}

fn load_config(path: &str) -> anyhow::Result<PulseConfig> {
    let json = std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path))?;
    let config = PulseConfig::from_json(&json).with_context(|| format!("invalid configuration in {}", path))?;
    Ok(config)
}
