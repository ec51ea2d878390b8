//! Host-facing frame processor plugin
//!
//! Camera hosts invoke the plugin once per frame with positional arguments
//! and expect a JSON object back. The plugin samples the frame, translates
//! the arguments into a [`FrameCommand`] and delegates to a [`PulseSession`].

use crate::sampler::{AreaAverageSampler, ColorSampler};
use ppg_core::{CameraFrame, FrameCommand, FrameResult, PpgResult};
use ppg_processing::{PulseConfig, PulseSession};
use serde_json::Value;
use std::sync::{Mutex, MutexGuard};
use tracing::warn;

/// Frame processor plugin owning one measurement session
pub struct HeartRatePlugin {
    session: Mutex<PulseSession>,
    sampler: Box<dyn ColorSampler>,
}

impl HeartRatePlugin {
    pub fn new(config: PulseConfig) -> PpgResult<Self> {
        Self::with_sampler(config, Box::new(AreaAverageSampler::default()))
    }

    pub fn with_sampler(config: PulseConfig, sampler: Box<dyn ColorSampler>) -> PpgResult<Self> {
        Ok(Self::from_session(PulseSession::new(config)?, sampler))
    }

    pub fn from_session(session: PulseSession, sampler: Box<dyn ColorSampler>) -> Self {
        Self {
            session: Mutex::new(session),
            sampler,
        }
    }

    /// Host entry point
    ///
    /// `arguments[0] == "true"` (or boolean `true`) requests a reset. Returns
    /// `None` when the frame has no readable image; the session is left
    /// untouched in that case, reset request included.
    pub fn callback(&self, frame: &CameraFrame, arguments: &[Value]) -> Option<Value> {
        let command = command_from_arguments(arguments);
        let result = self.process_typed(frame, command)?;

        match serde_json::to_value(&result) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(error = %e, "failed to serialise frame result");
                None
            }
        }
    }

    /// Typed entry point for in-process callers
    pub fn process_typed(&self, frame: &CameraFrame, command: FrameCommand) -> Option<FrameResult> {
        let buffer = match frame.buffer.as_ref() {
            Some(buffer) => buffer,
            None => {
                warn!(timestamp = %frame.timestamp, "frame dropped: no image buffer");
                return None;
            }
        };

        let color = match self.sampler.sample(buffer) {
            Ok(color) => color,
            Err(e) => {
                warn!(timestamp = %frame.timestamp, error = %e, "frame dropped");
                return None;
            }
        };

        Some(self.lock_session().process(color, command, frame.timestamp))
    }

    pub fn reset(&self) {
        self.lock_session().reset();
    }

    pub fn current_bpm(&self) -> u32 {
        self.lock_session().current_bpm()
    }

    fn lock_session(&self) -> MutexGuard<'_, PulseSession> {
        // A panic mid-frame leaves the session in a consistent per-field state
        self.session.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Positional host arguments to a typed command
pub fn command_from_arguments(arguments: &[Value]) -> FrameCommand {
    match arguments.first() {
        Some(Value::String(flag)) => FrameCommand::from_flag(Some(flag.as_str())),
        Some(Value::Bool(true)) => FrameCommand::Reset,
        _ => FrameCommand::None,
    }
}
