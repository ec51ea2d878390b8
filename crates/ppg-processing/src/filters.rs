//! Digital filters for the hue signal

use crate::config::BandPassConfig;
use crate::processor::SampleProcessor;
use ppg_core::{config_error, PpgResult};
use serde::{Deserialize, Serialize};
use std::f64::consts::{PI, SQRT_2};

/// Response shape of a biquad stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterType {
    /// 2nd-order Butterworth lowpass
    ButterworthLowpass,
    /// 2nd-order Butterworth highpass
    ButterworthHighpass,
}

/// Single biquad section (2nd order)
#[derive(Debug, Clone)]
pub struct BiquadStage {
    filter_type: FilterType,
    // y[n] = b0*x[n] + b1*x[n-1] + b2*x[n-2] - a1*y[n-1] - a2*y[n-2]
    b0: f64, b1: f64, b2: f64,
    a1: f64, a2: f64,
    x1: f64, x2: f64,
    y1: f64, y2: f64,
}

impl BiquadStage {
    /// Design a Butterworth stage by bilinear transform
    pub fn butterworth(filter_type: FilterType, cutoff_hz: f64, sample_rate_hz: f64) -> PpgResult<Self> {
        if !(cutoff_hz > 0.0 && cutoff_hz < sample_rate_hz / 2.0) {
            return Err(config_error!(
                "Cutoff {} Hz must lie between 0 and the Nyquist frequency {} Hz",
                cutoff_hz,
                sample_rate_hz / 2.0
            ));
        }

        // Pre-warp frequency for bilinear transform
        let omega_c = 2.0 * PI * cutoff_hz / sample_rate_hz;
        let k = (omega_c / 2.0).tan();
        let k2 = k * k;
        let norm = k2 + SQRT_2 * k + 1.0;

        let b0 = match filter_type {
            FilterType::ButterworthLowpass => k2 / norm,
            FilterType::ButterworthHighpass => 1.0 / norm,
        };
        let b1 = match filter_type {
            FilterType::ButterworthLowpass => 2.0 * b0,
            FilterType::ButterworthHighpass => -2.0 * b0,
        };

        Ok(BiquadStage {
            filter_type,
            b0,
            b1,
            b2: b0,
            a1: (2.0 * (k2 - 1.0)) / norm,
            a2: (k2 - SQRT_2 * k + 1.0) / norm,
            x1: 0.0,
            x2: 0.0,
            y1: 0.0,
            y2: 0.0,
        })
    }

    pub fn filter_type(&self) -> FilterType {
        self.filter_type
    }

    /// Load the input history as if `value` had been applied forever.
    /// A highpass stage then outputs zero for a constant input.
    fn prime(&mut self, value: f64) {
        self.x1 = value;
        self.x2 = value;
        self.y1 = 0.0;
        self.y2 = 0.0;
    }

    /// Magnitude response at `frequency_hz`
    pub fn gain_at(&self, frequency_hz: f64, sample_rate_hz: f64) -> f64 {
        let w = 2.0 * PI * frequency_hz / sample_rate_hz;
        let (c1, s1) = (w.cos(), w.sin());
        let (c2, s2) = ((2.0 * w).cos(), (2.0 * w).sin());

        let num_re = self.b0 + self.b1 * c1 + self.b2 * c2;
        let num_im = -(self.b1 * s1 + self.b2 * s2);
        let den_re = 1.0 + self.a1 * c1 + self.a2 * c2;
        let den_im = -(self.a1 * s1 + self.a2 * s2);

        (num_re.hypot(num_im)) / (den_re.hypot(den_im))
    }
}

impl SampleProcessor for BiquadStage {
    fn process_value(&mut self, input: f64) -> f64 {
        let output = self.b0 * input + self.b1 * self.x1 + self.b2 * self.x2
            - self.a1 * self.y1 - self.a2 * self.y2;

        self.x2 = self.x1;
        self.x1 = input;
        self.y2 = self.y1;
        self.y1 = output;

        output
    }

    fn reset(&mut self) {
        self.x1 = 0.0;
        self.x2 = 0.0;
        self.y1 = 0.0;
        self.y2 = 0.0;
    }

    fn name(&self) -> &str {
        match self.filter_type {
            FilterType::ButterworthLowpass => "Butterworth Lowpass",
            FilterType::ButterworthHighpass => "Butterworth Highpass",
        }
    }
}

/// Two-stage band-pass filter isolating the pulse band of the hue signal
///
/// The highpass stage removes the slowly varying baseline (skin tone,
/// ambient light), the lowpass stage smooths sensor noise. The first sample
/// after construction or [`reset`](SampleProcessor::reset) primes the
/// highpass history, so a constant baseline produces no start-up step.
#[derive(Debug, Clone)]
pub struct BandPassFilter {
    config: BandPassConfig,
    highpass: BiquadStage,
    lowpass: BiquadStage,
    primed: bool,
}

impl BandPassFilter {
    pub fn new(config: BandPassConfig) -> PpgResult<Self> {
        config.validate()?;

        let highpass = BiquadStage::butterworth(
            FilterType::ButterworthHighpass,
            config.highpass_cutoff_hz,
            config.frame_rate_hz,
        )?;
        let lowpass = BiquadStage::butterworth(
            FilterType::ButterworthLowpass,
            config.lowpass_cutoff_hz,
            config.frame_rate_hz,
        )?;

        Ok(BandPassFilter {
            config,
            highpass,
            lowpass,
            primed: false,
        })
    }

    pub fn config(&self) -> &BandPassConfig {
        &self.config
    }

    /// Combined magnitude response at `frequency_hz`
    pub fn gain_at(&self, frequency_hz: f64) -> f64 {
        let fs = self.config.frame_rate_hz;
        self.highpass.gain_at(frequency_hz, fs) * self.lowpass.gain_at(frequency_hz, fs)
    }
}

impl SampleProcessor for BandPassFilter {
    fn process_value(&mut self, value: f64) -> f64 {
        if !self.primed {
            self.highpass.prime(value);
            self.primed = true;
        }
        let detrended = self.highpass.process_value(value);
        self.lowpass.process_value(detrended)
    }

    fn reset(&mut self) {
        self.highpass.reset();
        self.lowpass.reset();
        self.primed = false;
    }

    fn name(&self) -> &str {
        "Band-pass Filter"
    }
}
