//! Per-session pulse state machine
//!
//! A [`PulseSession`] owns everything a measurement needs: presence gate,
//! band-pass filter, beat detector and the BEGIN/RECORDING mode. Creating
//! one starts a measurement; dropping it ends it.

use crate::color_space::rgb_to_hsv;
use crate::config::PulseConfig;
use crate::filters::BandPassFilter;
use crate::presence::{Presence, PresenceGate};
use crate::processor::SampleProcessor;
use crate::pulse_detector::PulseDetector;
use ppg_core::{
    ColorSample, FrameCommand, FrameResult, PpgResult, PrecisionTimestamp, SessionId, SessionMode,
    SystemTimestampProvider, TimestampProvider,
};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Heart-rate measurement session
pub struct PulseSession {
    id: SessionId,
    config: PulseConfig,
    gate: PresenceGate,
    filter: BandPassFilter,
    detector: PulseDetector,
    mode: SessionMode,
    valid_frame_count: u32,
    bpm: u32,
    clock: Arc<dyn TimestampProvider>,
}

impl PulseSession {
    /// Start a session stamping results with the system clock
    pub fn new(config: PulseConfig) -> PpgResult<Self> {
        Self::with_clock(config, Arc::new(SystemTimestampProvider))
    }

    /// Start a session with a custom wall-clock source
    pub fn with_clock(config: PulseConfig, clock: Arc<dyn TimestampProvider>) -> PpgResult<Self> {
        config.validate()?;

        let filter = BandPassFilter::new(config.filter)?;
        let session = PulseSession {
            id: SessionId::new(),
            gate: PresenceGate::new(config.presence),
            detector: PulseDetector::new(config.detector)?,
            filter,
            config,
            mode: SessionMode::Begin,
            valid_frame_count: 0,
            bpm: 0,
            clock,
        };

        let (min_bpm, max_bpm) = session.config.detector.bpm_range();
        debug!(
            session = %session.id,
            config = %session.config.name,
            min_bpm,
            max_bpm,
            "pulse session started"
        );
        Ok(session)
    }

    /// Process one frame's mean colour
    ///
    /// `timestamp` is the frame's monotonic capture time and drives beat
    /// interval measurement. A reset command is applied before the frame
    /// itself is evaluated.
    pub fn process(
        &mut self,
        color: ColorSample,
        command: FrameCommand,
        timestamp: PrecisionTimestamp,
    ) -> FrameResult {
        if command.is_reset() {
            debug!(session = %self.id, "reset requested by host");
            self.reset();
        }

        let hsv = rgb_to_hsv(color);
        let mut filtered = 0.0;

        match self.gate.classify(&hsv) {
            Presence::Invalid => {
                if self.mode == SessionMode::Recording {
                    debug!(
                        session = %self.id,
                        saturation = hsv.saturation,
                        value = hsv.value,
                        "finger contact lost"
                    );
                }
                self.reset();
            }
            Presence::Valid => {
                if self.mode == SessionMode::Begin {
                    debug!(session = %self.id, "finger contact detected");
                }
                self.mode = SessionMode::Recording;
                self.valid_frame_count = self.valid_frame_count.saturating_add(1);

                if self.valid_frame_count > self.config.warmup_frames {
                    if self.valid_frame_count == self.config.warmup_frames + 1 {
                        debug!(session = %self.id, "warm-up complete");
                    }
                    filtered = self.filter.process_value(hsv.hue);
                    self.detector.add_value(filtered, timestamp.as_secs_f64());
                    self.bpm = self.detector.bpm();
                }
            }
        }

        FrameResult::new(
            color,
            hsv,
            filtered,
            self.wall_clock_secs(),
            self.bpm,
            self.mode,
            self.valid_frame_count,
        )
    }

    /// Return to BEGIN, discarding filter and detector history
    pub fn reset(&mut self) {
        self.filter.reset();
        self.detector.reset();
        self.mode = SessionMode::Begin;
        self.valid_frame_count = 0;
        self.bpm = 0;
    }

    fn wall_clock_secs(&self) -> f64 {
        match self.clock.now() {
            Ok(now) => now.as_secs_f64(),
            Err(e) => {
                warn!(session = %self.id, error = %e, "wall clock unavailable");
                0.0
            }
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    pub fn valid_frame_count(&self) -> u32 {
        self.valid_frame_count
    }

    /// Last reported heart rate, 0 when none is available
    pub fn current_bpm(&self) -> u32 {
        self.bpm
    }

    pub fn config(&self) -> &PulseConfig {
        &self.config
    }
}

impl fmt::Debug for PulseSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PulseSession")
            .field("id", &self.id)
            .field("mode", &self.mode)
            .field("valid_frame_count", &self.valid_frame_count)
            .field("bpm", &self.bpm)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color_space::hsv_to_rgb;
    use ppg_core::{HsvSample, ManualTimestampProvider, PpgError};
    use std::f64::consts::PI;

    const FPS: f64 = 30.0;
    const EPOCH_SECS: u64 = 1_700_000_000;

    fn finger(hue: f64) -> ColorSample {
        hsv_to_rgb(HsvSample::new(hue, 0.9, 0.85))
    }

    fn ambient() -> ColorSample {
        hsv_to_rgb(HsvSample::new(0.15, 0.2, 0.4))
    }

    fn pulse_hue(frame: u32, bpm: f64) -> f64 {
        let t = frame as f64 / FPS;
        0.02 + 0.005 * (2.0 * PI * bpm / 60.0 * t).sin()
    }

    fn at(frame: u32) -> PrecisionTimestamp {
        PrecisionTimestamp::from_secs_f64(frame as f64 / FPS)
    }

    fn session() -> PulseSession {
        let clock = Arc::new(ManualTimestampProvider::new(PrecisionTimestamp::from_secs(EPOCH_SECS)));
        PulseSession::with_clock(PulseConfig::standard(), clock).unwrap()
    }

    fn run_pulse(session: &mut PulseSession, frames: std::ops::Range<u32>, bpm: f64) -> Vec<FrameResult> {
        frames
            .map(|i| session.process(finger(pulse_hue(i, bpm)), FrameCommand::None, at(i)))
            .collect()
    }

    struct BrokenClock;

    impl TimestampProvider for BrokenClock {
        fn now(&self) -> PpgResult<PrecisionTimestamp> {
            Err(PpgError::InvalidTimestamp { reason: "clock unavailable" })
        }
    }

    #[test]
    fn test_initial_state() {
        let session = session();
        assert_eq!(session.mode(), SessionMode::Begin);
        assert_eq!(session.valid_frame_count(), 0);
        assert_eq!(session.current_bpm(), 0);
    }

    #[test]
    fn test_warmup_gating() {
        let mut session = session();
        let warmup = run_pulse(&mut session, 0..60, 72.0);

        for (i, result) in warmup.iter().enumerate() {
            assert_eq!(result.mode, SessionMode::Recording);
            assert_eq!(result.valid_frame_count, i as u32 + 1);
            assert_eq!(result.filtered, 0.0);
            assert_eq!(result.bpm, 0);
        }

        let after = run_pulse(&mut session, 60..90, 72.0);
        assert_eq!(after[0].valid_frame_count, 61);
        assert!(after.iter().any(|r| r.filtered != 0.0));
    }

    #[test]
    fn test_recovers_72_bpm() {
        let mut session = session();
        let results = run_pulse(&mut session, 0..360, 72.0);

        let last = results.last().unwrap();
        assert_eq!(last.mode, SessionMode::Recording);
        assert_eq!(last.valid_frame_count, 360);
        assert!(
            (68..=76).contains(&last.bpm),
            "expected about 72 BPM, got {}",
            last.bpm
        );
        assert_eq!(session.current_bpm(), last.bpm);
    }

    #[test]
    fn test_72_bpm_settles_within_five_seconds() {
        let mut session = session();
        let results = run_pulse(&mut session, 0..360, 72.0);

        for result in &results[160..] {
            assert!(
                (68..=76).contains(&result.bpm),
                "frame {}: expected about 72 BPM, got {}",
                result.valid_frame_count,
                result.bpm
            );
        }
    }

    #[test]
    fn test_recovers_other_rates() {
        for &bpm in &[60.0, 90.0, 120.0] {
            let mut session = session();
            let results = run_pulse(&mut session, 0..420, bpm);
            let reported = results.last().unwrap().bpm as f64;
            assert!(
                (reported - bpm).abs() <= bpm * 0.05,
                "expected about {} BPM, got {}",
                bpm,
                reported
            );
        }
    }

    #[test]
    fn test_invalid_frame_resets() {
        let mut session = session();
        run_pulse(&mut session, 0..300, 72.0);
        assert!(session.current_bpm() > 0);

        let result = session.process(ambient(), FrameCommand::None, at(300));
        assert_eq!(result.mode, SessionMode::Begin);
        assert_eq!(result.valid_frame_count, 0);
        assert_eq!(result.bpm, 0);
        assert_eq!(result.filtered, 0.0);
        assert!(result.saturation < 0.5);

        let result = session.process(finger(0.02), FrameCommand::None, at(301));
        assert_eq!(result.mode, SessionMode::Recording);
        assert_eq!(result.valid_frame_count, 1);
        assert_eq!(result.bpm, 0);
    }

    #[test]
    fn test_reset_command_applies_before_frame() {
        let mut session = session();
        run_pulse(&mut session, 0..300, 72.0);

        let result = session.process(finger(0.02), FrameCommand::Reset, at(300));
        assert_eq!(result.mode, SessionMode::Recording);
        assert_eq!(result.valid_frame_count, 1);
        assert_eq!(result.bpm, 0);
        assert_eq!(result.filtered, 0.0);

        let result = session.process(ambient(), FrameCommand::Reset, at(301));
        assert_eq!(result.mode, SessionMode::Begin);
        assert_eq!(result.valid_frame_count, 0);
    }

    #[test]
    fn test_reset_is_idempotent() {
        let mut once = session();
        let mut twice = session();
        run_pulse(&mut once, 0..200, 72.0);
        run_pulse(&mut twice, 0..200, 90.0);

        once.reset();
        twice.reset();
        twice.reset();

        let a = run_pulse(&mut once, 200..500, 72.0);
        let b = run_pulse(&mut twice, 200..500, 72.0);
        assert_eq!(a, b);
    }

    #[test]
    fn test_constant_hue_reports_no_rate() {
        let mut session = session();
        for i in 0..600 {
            let result = session.process(finger(0.02), FrameCommand::None, at(i));
            assert!(result.filtered.abs() < 1e-9);
            assert_eq!(result.bpm, 0);
        }
        assert_eq!(session.valid_frame_count(), 600);
    }

    #[test]
    fn test_deterministic_output() {
        let mut a = session();
        let mut b = session();
        let first = run_pulse(&mut a, 0..400, 72.0);
        let second = run_pulse(&mut b, 0..400, 72.0);
        assert_eq!(first, second);
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_result_carries_inputs_and_clock() {
        let mut session = session();
        let color = ColorSample::from_rgb8(220, 30, 20);
        let result = session.process(color, FrameCommand::None, at(0));

        assert_eq!(result.red, 220.0);
        assert_eq!(result.green, 30.0);
        assert_eq!(result.blue, 20.0);
        assert_eq!(result.time, EPOCH_SECS as f64);
        assert!(result.brightness > 0.5 && result.saturation > 0.5);
    }

    #[test]
    fn test_broken_clock_reports_zero_time() {
        let mut session = PulseSession::with_clock(PulseConfig::standard(), Arc::new(BrokenClock)).unwrap();
        let result = session.process(finger(0.02), FrameCommand::None, at(0));
        assert_eq!(result.time, 0.0);
        assert_eq!(result.valid_frame_count, 1);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = PulseConfig::standard();
        config.filter.lowpass_cutoff_hz = 20.0;
        assert!(matches!(
            PulseSession::new(config),
            Err(PpgError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_custom_warmup() {
        let mut config = PulseConfig::standard();
        config.warmup_frames = 5;
        let mut session = PulseSession::new(config).unwrap();

        let results = run_pulse(&mut session, 0..12, 72.0);
        assert!(results[..5].iter().all(|r| r.filtered == 0.0));
        assert!(results[6..].iter().any(|r| r.filtered != 0.0));
    }
}
