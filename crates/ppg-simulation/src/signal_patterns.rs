//! Pre-defined hue waveforms for pulse simulation

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Breathing cycle used to modulate the heart rate of [`SignalPattern::Arrhythmic`]
const BREATHING_HZ: f64 = 0.25;

/// Hue of the fingertip image over time
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SignalPattern {
    /// No pulse, fixed hue
    Constant { hue: f64 },
    /// Steady heart rate
    Pulse {
        bpm: f64,
        amplitude: f64,
        baseline: f64,
    },
    /// Steady heart rate riding on a slow baseline oscillation
    PulseWithDrift {
        bpm: f64,
        amplitude: f64,
        baseline: f64,
        drift_hz: f64,
        drift_amplitude: f64,
    },
    /// Heart rate varying by `±jitter` (fraction) over each breathing cycle
    Arrhythmic {
        bpm: f64,
        amplitude: f64,
        baseline: f64,
        jitter: f64,
    },
}

impl SignalPattern {
    /// Hue at `time` seconds, wrapped into [0, 1)
    pub fn hue_at_time(&self, time: f64) -> f64 {
        let hue = match *self {
            SignalPattern::Constant { hue } => hue,

            SignalPattern::Pulse { bpm, amplitude, baseline } => {
                baseline + amplitude * (2.0 * PI * bpm / 60.0 * time).sin()
            }

            SignalPattern::PulseWithDrift {
                bpm,
                amplitude,
                baseline,
                drift_hz,
                drift_amplitude,
            } => {
                let drift = drift_amplitude * (2.0 * PI * drift_hz * time).sin();
                baseline + drift + amplitude * (2.0 * PI * bpm / 60.0 * time).sin()
            }

            SignalPattern::Arrhythmic { bpm, amplitude, baseline, jitter } => {
                // Integral of f0 * (1 + jitter * sin(2π f_b t))
                let f0 = bpm / 60.0;
                let modulation = jitter / (2.0 * PI * BREATHING_HZ) * (1.0 - (2.0 * PI * BREATHING_HZ * time).cos());
                baseline + amplitude * (2.0 * PI * f0 * (time + modulation)).sin()
            }
        };
        hue.rem_euclid(1.0)
    }

    /// Nominal heart rate, if the pattern has one
    pub fn expected_bpm(&self) -> Option<f64> {
        match *self {
            SignalPattern::Constant { .. } => None,
            SignalPattern::Pulse { bpm, .. }
            | SignalPattern::PulseWithDrift { bpm, .. }
            | SignalPattern::Arrhythmic { bpm, .. } => Some(bpm),
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            SignalPattern::Constant { .. } => "No pulse",
            SignalPattern::Pulse { .. } => "Steady pulse",
            SignalPattern::PulseWithDrift { .. } => "Pulse with baseline drift",
            SignalPattern::Arrhythmic { .. } => "Pulse with rate variability",
        }
    }

    /// Common preset patterns
    pub fn presets() -> Vec<(&'static str, SignalPattern)> {
        vec![
            ("No Pulse", SignalPattern::Constant { hue: 0.02 }),
            ("Resting", SignalPattern::Pulse {
                bpm: 62.0, amplitude: 0.004, baseline: 0.02
            }),
            ("Normal", SignalPattern::Pulse {
                bpm: 72.0, amplitude: 0.004, baseline: 0.02
            }),
            ("Exercise", SignalPattern::Pulse {
                bpm: 125.0, amplitude: 0.003, baseline: 0.025
            }),
            ("Pressure Drift", SignalPattern::PulseWithDrift {
                bpm: 72.0, amplitude: 0.004, baseline: 0.02, drift_hz: 0.1, drift_amplitude: 0.006
            }),
            ("Sinus Arrhythmia", SignalPattern::Arrhythmic {
                bpm: 80.0, amplitude: 0.004, baseline: 0.02, jitter: 0.08
            }),
        ]
    }
}

impl Default for SignalPattern {
    fn default() -> Self {
        SignalPattern::Pulse {
            bpm: 72.0,
            amplitude: 0.004,
            baseline: 0.02,
        }
    }
}
