//! Frame processing service for streaming hosts

use crate::plugin::HeartRatePlugin;
use ppg_core::{CameraFrame, FrameCommand, FrameResult, PpgResult};
use ppg_processing::PulseConfig;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{broadcast, mpsc, Mutex};
use tracing::{debug, info, warn};

/// Results buffered per subscriber before it starts lagging
const OUTPUT_BUFFER: usize = 256;

/// Commands for controlling processing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceCommand {
    Start,
    /// Stop and reset the session
    Stop,
    Pause,
    Resume,
    /// Reset the session with the next processed frame
    Reset,
}

/// Statistics about processing performance
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceStats {
    pub is_running: bool,
    pub frames_processed: u64,
    /// Frames that arrived without a readable image
    pub frames_dropped: u64,
    pub average_latency_us: u64,
    pub last_bpm: u32,
}

/// Consumes camera frames, publishes frame results
pub struct HeartRateService {
    plugin: Arc<HeartRatePlugin>,
    input_receiver: broadcast::Receiver<CameraFrame>,
    output_sender: broadcast::Sender<FrameResult>,
    command_receiver: mpsc::Receiver<ServiceCommand>,
    command_sender: mpsc::Sender<ServiceCommand>,
    stats: Arc<Mutex<ServiceStats>>,
}

/// Loop-owned state of a running service
struct Worker {
    plugin: Arc<HeartRatePlugin>,
    output_sender: broadcast::Sender<FrameResult>,
    stats: Arc<Mutex<ServiceStats>>,
    running: bool,
    pending_reset: bool,
    total_latency_us: u64,
}

impl HeartRateService {
    pub fn new(input_receiver: broadcast::Receiver<CameraFrame>, config: PulseConfig) -> PpgResult<Self> {
        let plugin = HeartRatePlugin::new(config)?;
        Ok(Self::with_plugin(input_receiver, Arc::new(plugin)))
    }

    pub fn with_plugin(input_receiver: broadcast::Receiver<CameraFrame>, plugin: Arc<HeartRatePlugin>) -> Self {
        let (output_sender, _) = broadcast::channel(OUTPUT_BUFFER);
        let (command_sender, command_receiver) = mpsc::channel(32);

        HeartRateService {
            plugin,
            input_receiver,
            output_sender,
            command_receiver,
            command_sender,
            stats: Arc::new(Mutex::new(ServiceStats::default())),
        }
    }

    /// Get output receiver for frame results
    pub fn subscribe_output(&self) -> broadcast::Receiver<FrameResult> {
        self.output_sender.subscribe()
    }

    /// Get command sender for controlling processing
    pub fn command_handle(&self) -> mpsc::Sender<ServiceCommand> {
        self.command_sender.clone()
    }

    pub fn stats_handle(&self) -> Arc<Mutex<ServiceStats>> {
        Arc::clone(&self.stats)
    }

    pub fn plugin(&self) -> Arc<HeartRatePlugin> {
        Arc::clone(&self.plugin)
    }

    /// Main processing loop
    ///
    /// Starts paused. Ends when the input channel closes or every command
    /// handle has been dropped.
    pub async fn run(self) -> PpgResult<()> {
        let HeartRateService {
            plugin,
            mut input_receiver,
            output_sender,
            mut command_receiver,
            command_sender,
            stats,
        } = self;
        drop(command_sender);

        let mut worker = Worker {
            plugin,
            output_sender,
            stats,
            running: false,
            pending_reset: false,
            total_latency_us: 0,
        };

        info!("heart rate service ready");

        loop {
            tokio::select! {
                biased;

                command = command_receiver.recv() => {
                    match command {
                        Some(command) => worker.handle_command(command).await,
                        None => {
                            debug!("command channel closed");
                            break;
                        }
                    }
                }

                frame = input_receiver.recv() => {
                    match frame {
                        Ok(frame) => {
                            if worker.running {
                                worker.process_frame(frame).await;
                            }
                        }
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            warn!(skipped, "processing lagged behind the camera");
                        }
                        Err(broadcast::error::RecvError::Closed) => {
                            info!("input channel closed, stopping heart rate service");
                            break;
                        }
                    }
                }
            }
        }

        Ok(())
    }
}

impl Worker {
    async fn handle_command(&mut self, command: ServiceCommand) {
        match command {
            ServiceCommand::Start | ServiceCommand::Resume => {
                self.running = true;
                self.stats.lock().await.is_running = true;
                info!(?command, "processing running");
            }
            ServiceCommand::Pause => {
                self.running = false;
                self.stats.lock().await.is_running = false;
                info!("processing paused");
            }
            ServiceCommand::Stop => {
                self.running = false;
                self.pending_reset = false;
                self.total_latency_us = 0;
                self.plugin.reset();
                *self.stats.lock().await = ServiceStats::default();
                info!("processing stopped");
            }
            ServiceCommand::Reset => {
                self.pending_reset = true;
                debug!("reset scheduled for next frame");
            }
        }
    }

    async fn process_frame(&mut self, frame: CameraFrame) {
        let command = if self.pending_reset {
            FrameCommand::Reset
        } else {
            FrameCommand::None
        };

        let started = Instant::now();
        let result = self.plugin.process_typed(&frame, command);
        let latency_us = started.elapsed().as_micros() as u64;

        let mut stats = self.stats.lock().await;
        match result {
            Some(result) => {
                // A dropped frame does not consume the reset
                self.pending_reset = false;

                stats.frames_processed += 1;
                self.total_latency_us += latency_us;
                stats.average_latency_us = self.total_latency_us / stats.frames_processed;

                if result.has_bpm() && result.bpm != stats.last_bpm {
                    debug!(bpm = result.bpm, "heart rate updated");
                }
                stats.last_bpm = result.bpm;

                // No subscribers is not an error
                let _ = self.output_sender.send(result);
            }
            None => stats.frames_dropped += 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ppg_core::{ColorSample, FrameBuffer, PixelFormat, PrecisionTimestamp, SessionMode};
    use ppg_simulation::{FrameSimulator, SimulatorConfig};
    use tokio::time::{sleep, Duration};

    fn finger_frame(i: u64) -> CameraFrame {
        let buffer = FrameBuffer::filled(4, 4, PixelFormat::Rgba8, ColorSample::from_rgb8(220, 40, 25));
        CameraFrame::new(buffer, PrecisionTimestamp::from_millis(i * 33))
    }

    struct Harness {
        frames: broadcast::Sender<CameraFrame>,
        results: broadcast::Receiver<FrameResult>,
        commands: mpsc::Sender<ServiceCommand>,
        stats: Arc<Mutex<ServiceStats>>,
    }

    fn spawn_service() -> Harness {
        let (frames, input) = broadcast::channel(64);
        let service = HeartRateService::new(input, PulseConfig::standard()).unwrap();
        let harness = Harness {
            frames,
            results: service.subscribe_output(),
            commands: service.command_handle(),
            stats: service.stats_handle(),
        };
        tokio::spawn(service.run());
        harness
    }

    #[tokio::test]
    async fn test_processes_frames_when_started() {
        let mut h = spawn_service();
        h.commands.send(ServiceCommand::Start).await.unwrap();

        for i in 0..10 {
            h.frames.send(finger_frame(i)).unwrap();
            let result = h.results.recv().await.unwrap();
            assert_eq!(result.valid_frame_count, i as u32 + 1);
            assert_eq!(result.mode, SessionMode::Recording);
        }

        let stats = h.stats.lock().await.clone();
        assert!(stats.is_running);
        assert_eq!(stats.frames_processed, 10);
        assert_eq!(stats.frames_dropped, 0);
    }

    #[tokio::test]
    async fn test_ignores_frames_until_started() {
        let mut h = spawn_service();
        h.frames.send(finger_frame(0)).unwrap();
        sleep(Duration::from_millis(50)).await;

        h.commands.send(ServiceCommand::Start).await.unwrap();
        h.frames.send(finger_frame(1)).unwrap();
        assert_eq!(h.results.recv().await.unwrap().valid_frame_count, 1);
    }

    #[tokio::test]
    async fn test_dropped_frames_counted() {
        let mut h = spawn_service();
        h.commands.send(ServiceCommand::Start).await.unwrap();

        h.frames.send(finger_frame(0)).unwrap();
        h.results.recv().await.unwrap();

        h.commands.send(ServiceCommand::Reset).await.unwrap();
        h.frames.send(CameraFrame::unavailable(PrecisionTimestamp::from_millis(33))).unwrap();
        h.frames.send(finger_frame(2)).unwrap();

        // The reset survives the dropped frame and lands on the next real one
        let result = h.results.recv().await.unwrap();
        assert_eq!(result.valid_frame_count, 1);

        let stats = h.stats.lock().await.clone();
        assert_eq!(stats.frames_processed, 2);
        assert_eq!(stats.frames_dropped, 1);
    }

    #[tokio::test]
    async fn test_stop_resets_session_and_stats() {
        let mut h = spawn_service();
        h.commands.send(ServiceCommand::Start).await.unwrap();
        for i in 0..5 {
            h.frames.send(finger_frame(i)).unwrap();
            h.results.recv().await.unwrap();
        }

        h.commands.send(ServiceCommand::Stop).await.unwrap();
        h.commands.send(ServiceCommand::Start).await.unwrap();
        h.frames.send(finger_frame(5)).unwrap();

        assert_eq!(h.results.recv().await.unwrap().valid_frame_count, 1);
        assert_eq!(h.stats.lock().await.frames_processed, 1);
    }

    #[tokio::test]
    async fn test_simulated_pulse_end_to_end() {
        let mut h = spawn_service();
        h.commands.send(ServiceCommand::Start).await.unwrap();

        let mut simulator = FrameSimulator::new(SimulatorConfig {
            seed: Some(42),
            ..SimulatorConfig::default()
        })
        .unwrap();

        let mut last = None;
        for frame in simulator.generate(450) {
            h.frames.send(frame).unwrap();
            last = Some(h.results.recv().await.unwrap());
        }

        let last = last.unwrap();
        assert!(
            (68..=76).contains(&last.bpm),
            "expected about 72 BPM, got {}",
            last.bpm
        );
        assert_eq!(h.stats.lock().await.last_bpm, last.bpm);
    }

    #[tokio::test]
    async fn test_ends_when_input_closes() {
        let (frames, input) = broadcast::channel(8);
        let service = HeartRateService::new(input, PulseConfig::standard()).unwrap();
        let _commands = service.command_handle();
        let task = tokio::spawn(service.run());

        drop(frames);
        assert!(task.await.unwrap().is_ok());
    }
}
