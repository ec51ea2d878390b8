//! Camera frame simulator for a fingertip pressed against a lit lens

use crate::signal_patterns::SignalPattern;
use ppg_core::{CameraFrame, ColorSample, FrameBuffer, HsvSample, PixelFormat, PpgError, PpgResult, PrecisionTimestamp};
use ppg_processing::hsv_to_rgb;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

/// Colour of the scene while no finger covers the lens
const AMBIENT: HsvSample = HsvSample { hue: 0.12, saturation: 0.25, value: 0.35 };

/// When the finger covers the lens
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ContactSchedule {
    Always,
    Never,
    /// Finger lifted for `start_s <= t < end_s`
    LiftedBetween { start_s: f64, end_s: f64 },
}

impl ContactSchedule {
    pub fn in_contact(&self, time: f64) -> bool {
        match *self {
            ContactSchedule::Always => true,
            ContactSchedule::Never => false,
            ContactSchedule::LiftedBetween { start_s, end_s } => !(start_s..end_s).contains(&time),
        }
    }
}

/// Configuration for frame simulation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulatorConfig {
    pub frame_rate_hz: f64,
    /// Image geometry; kept small, samplers only need the mean colour
    pub width: usize,
    pub height: usize,
    pub format: PixelFormat,
    pub pattern: SignalPattern,
    pub contact: ContactSchedule,
    /// Fingertip saturation and brightness while in contact
    pub saturation: f64,
    pub value: f64,
    /// Gaussian noise added to the hue of each frame
    pub hue_noise_std: f64,
    /// Gaussian noise added to every pixel channel (8-bit counts)
    pub pixel_noise_std: f64,
    /// Probability that a frame arrives without an image
    pub drop_probability: f64,
    /// Random seed for reproducibility
    pub seed: Option<u64>,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            frame_rate_hz: 30.0,
            width: 16,
            height: 12,
            format: PixelFormat::Rgba8,
            pattern: SignalPattern::default(),
            contact: ContactSchedule::Always,
            saturation: 0.9,
            value: 0.85,
            hue_noise_std: 0.0002,
            pixel_noise_std: 1.5,
            drop_probability: 0.0,
            seed: None,
        }
    }
}

impl SimulatorConfig {
    pub fn validate(&self) -> PpgResult<()> {
        if !(self.frame_rate_hz.is_finite() && self.frame_rate_hz > 0.0) {
            return Err(PpgError::config(format!("Frame rate must be positive, got {}", self.frame_rate_hz)));
        }
        if self.width == 0 || self.height == 0 {
            return Err(PpgError::config("Frame dimensions must be non-zero"));
        }
        if !(0.0..=1.0).contains(&self.drop_probability) {
            return Err(PpgError::config(format!(
                "Drop probability must be in [0, 1], got {}",
                self.drop_probability
            )));
        }
        if self.hue_noise_std < 0.0 || self.pixel_noise_std < 0.0 {
            return Err(PpgError::config("Noise levels cannot be negative"));
        }
        Ok(())
    }
}

/// Deterministic (when seeded) generator of [`CameraFrame`]s
pub struct FrameSimulator {
    config: SimulatorConfig,
    rng: rand::rngs::StdRng,
    hue_noise: Normal<f64>,
    pixel_noise: Normal<f64>,
    frame_index: u64,
}

impl FrameSimulator {
    pub fn new(config: SimulatorConfig) -> PpgResult<Self> {
        config.validate()?;

        let seed = config.seed.unwrap_or_else(rand::random);
        let (hue_noise, pixel_noise) = Self::noise(&config)?;

        Ok(FrameSimulator {
            rng: rand::rngs::StdRng::seed_from_u64(seed),
            hue_noise,
            pixel_noise,
            config,
            frame_index: 0,
        })
    }

    fn noise(config: &SimulatorConfig) -> PpgResult<(Normal<f64>, Normal<f64>)> {
        let build = |std: f64| {
            Normal::new(0.0, std)
                .map_err(|e| PpgError::config(format!("Failed to create normal distribution: {}", e)))
        };
        Ok((build(config.hue_noise_std)?, build(config.pixel_noise_std)?))
    }

    /// Simulation time of the next frame in seconds
    pub fn elapsed_secs(&self) -> f64 {
        self.frame_index as f64 / self.config.frame_rate_hz
    }

    /// Produce the next frame
    pub fn next_frame(&mut self) -> CameraFrame {
        let time = self.elapsed_secs();
        let timestamp = PrecisionTimestamp::from_secs_f64(time);
        self.frame_index += 1;

        if self.config.drop_probability > 0.0 && self.rng.gen::<f64>() < self.config.drop_probability {
            return CameraFrame::unavailable(timestamp);
        }

        let hsv = if self.config.contact.in_contact(time) {
            let hue = self.config.pattern.hue_at_time(time) + self.hue_noise.sample(&mut self.rng);
            HsvSample::new(hue.rem_euclid(1.0), self.config.saturation, self.config.value)
        } else {
            AMBIENT
        };

        CameraFrame::new(self.render(hsv_to_rgb(hsv)), timestamp)
    }

    /// Produce `count` consecutive frames
    pub fn generate(&mut self, count: usize) -> Vec<CameraFrame> {
        (0..count).map(|_| self.next_frame()).collect()
    }

    /// Fill a buffer with `color` plus per-pixel noise
    fn render(&mut self, color: ColorSample) -> FrameBuffer {
        let format = self.config.format;
        let pixels = self.config.width * self.config.height;
        let mut data = Vec::with_capacity(pixels * format.bytes_per_pixel());

        for _ in 0..pixels {
            let mut channel = |level: f64| {
                (level + self.pixel_noise.sample(&mut self.rng)).round().clamp(0.0, 255.0) as u8
            };
            let (r, g, b) = (channel(color.red), channel(color.green), channel(color.blue));
            match format {
                PixelFormat::Rgba8 => data.extend_from_slice(&[r, g, b, 255]),
                PixelFormat::Bgra8 => data.extend_from_slice(&[b, g, r, 255]),
                PixelFormat::Rgb8 => data.extend_from_slice(&[r, g, b]),
            }
        }

        FrameBuffer {
            width: self.config.width,
            height: self.config.height,
            format,
            data,
        }
    }

    /// Restart simulation time at zero
    pub fn reset_time(&mut self) {
        self.frame_index = 0;
    }

    pub fn update_pattern(&mut self, pattern: SignalPattern) {
        self.config.pattern = pattern;
    }

    pub fn set_contact(&mut self, contact: ContactSchedule) {
        self.config.contact = contact;
    }

    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    /// Replace the configuration, keeping the random stream and clock
    pub fn update_config(&mut self, config: SimulatorConfig) -> PpgResult<()> {
        config.validate()?;
        let (hue_noise, pixel_noise) = Self::noise(&config)?;
        self.hue_noise = hue_noise;
        self.pixel_noise = pixel_noise;
        self.config = config;
        Ok(())
    }
}
