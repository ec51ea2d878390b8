//! Real-time frame streaming at camera rate

use crate::frame_simulator::{ContactSchedule, FrameSimulator, SimulatorConfig};
use crate::signal_patterns::SignalPattern;
use ppg_core::{CameraFrame, PpgResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, Mutex};
use tokio::time::{interval, Duration, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

/// Configuration for real-time streaming
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamConfig {
    pub simulator: SimulatorConfig,
    /// Frames buffered per subscriber before it starts lagging
    pub buffer_size: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            simulator: SimulatorConfig::default(),
            buffer_size: 64,
        }
    }
}

/// Commands for controlling the stream
#[derive(Debug, Clone)]
pub enum StreamCommand {
    Start,
    /// Stop and rewind simulation time
    Stop,
    Pause,
    Resume,
    UpdatePattern(SignalPattern),
    SetContact(ContactSchedule),
}

/// Stream statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StreamStats {
    pub is_running: bool,
    pub frames_generated: u64,
    pub frames_dropped: u64,
    /// Simulation time of the last frame (seconds)
    pub elapsed_secs: f64,
    pub average_frame_time_us: u64,
}

/// Frame source ticking at the configured frame rate
pub struct RealTimeFrameStream {
    config: StreamConfig,
    simulator: FrameSimulator,
    data_sender: broadcast::Sender<CameraFrame>,
    control_receiver: mpsc::Receiver<StreamCommand>,
    control_sender: mpsc::Sender<StreamCommand>,
    stats: Arc<Mutex<StreamStats>>,
}

impl RealTimeFrameStream {
    pub fn new(config: StreamConfig) -> PpgResult<Self> {
        let simulator = FrameSimulator::new(config.simulator.clone())?;
        let (data_sender, _) = broadcast::channel(config.buffer_size.max(1));
        let (control_sender, control_receiver) = mpsc::channel(32);

        Ok(RealTimeFrameStream {
            config,
            simulator,
            data_sender,
            control_receiver,
            control_sender,
            stats: Arc::new(Mutex::new(StreamStats::default())),
        })
    }

    /// Get a receiver for frames
    pub fn subscribe(&self) -> broadcast::Receiver<CameraFrame> {
        self.data_sender.subscribe()
    }

    /// Get control sender for sending commands
    pub fn control_handle(&self) -> mpsc::Sender<StreamCommand> {
        self.control_sender.clone()
    }

    /// Shared statistics, updated as frames are produced
    pub fn stats_handle(&self) -> Arc<Mutex<StreamStats>> {
        Arc::clone(&self.stats)
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    /// Run until every control handle is dropped
    ///
    /// The stream starts paused; send [`StreamCommand::Start`] to begin.
    pub async fn run(self) -> PpgResult<()> {
        let RealTimeFrameStream {
            config,
            mut simulator,
            data_sender,
            mut control_receiver,
            control_sender,
            stats,
        } = self;
        drop(control_sender);

        let frame_period = Duration::from_secs_f64(1.0 / config.simulator.frame_rate_hz);
        let mut ticker = interval(frame_period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut running = false;
        let mut total_frame_time_us: u64 = 0;

        info!(
            frame_rate_hz = config.simulator.frame_rate_hz,
            pattern = config.simulator.pattern.description(),
            "frame stream ready"
        );

        loop {
            tokio::select! {
                _ = ticker.tick(), if running => {
                    let started = Instant::now();
                    let frame = simulator.next_frame();
                    let dropped = frame.buffer.is_none();
                    let elapsed_us = started.elapsed().as_micros() as u64;

                    // No receivers is not an error
                    let _ = data_sender.send(frame);

                    let mut stats = stats.lock().await;
                    stats.frames_generated += 1;
                    if dropped {
                        stats.frames_dropped += 1;
                    }
                    stats.elapsed_secs = simulator.elapsed_secs();
                    total_frame_time_us += elapsed_us;
                    stats.average_frame_time_us = total_frame_time_us / stats.frames_generated;

                    if elapsed_us > frame_period.as_micros() as u64 {
                        warn!(elapsed_us, "frame generation slower than frame period");
                    }
                }

                command = control_receiver.recv() => {
                    match command {
                        Some(StreamCommand::Start) => {
                            running = true;
                            stats.lock().await.is_running = true;
                            info!("frame stream started");
                        }
                        Some(StreamCommand::Stop) => {
                            running = false;
                            simulator.reset_time();
                            total_frame_time_us = 0;
                            *stats.lock().await = StreamStats::default();
                            info!("frame stream stopped");
                        }
                        Some(StreamCommand::Pause) => {
                            running = false;
                            stats.lock().await.is_running = false;
                            info!("frame stream paused");
                        }
                        Some(StreamCommand::Resume) => {
                            running = true;
                            stats.lock().await.is_running = true;
                            info!("frame stream resumed");
                        }
                        Some(StreamCommand::UpdatePattern(pattern)) => {
                            simulator.update_pattern(pattern);
                            info!(pattern = pattern.description(), "frame stream pattern updated");
                        }
                        Some(StreamCommand::SetContact(contact)) => {
                            simulator.set_contact(contact);
                            debug!(?contact, "finger contact schedule changed");
                        }
                        None => {
                            debug!("frame stream control channel closed");
                            break;
                        }
                    }
                }
            }
        }

        Ok(())
    }
}

/// Create a stream and run it in a background task
pub fn start_frame_stream(
    config: StreamConfig,
) -> PpgResult<(broadcast::Receiver<CameraFrame>, mpsc::Sender<StreamCommand>)> {
    let stream = RealTimeFrameStream::new(config)?;
    let data_receiver = stream.subscribe();
    let control_sender = stream.control_handle();

    tokio::spawn(async move {
        if let Err(e) = stream.run().await {
            error!(error = %e, "frame stream failed");
        }
    });

    Ok((data_receiver, control_sender))
}
