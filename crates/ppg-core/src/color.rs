//! Colour samples produced once per camera frame

use serde::{Deserialize, Serialize};

/// Upper bound of an 8-bit colour channel
pub const CHANNEL_MAX: f64 = 255.0;

/// Mean red/green/blue intensity over a frame, each channel in [0, 255]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorSample {
    pub red: f64,
    pub green: f64,
    pub blue: f64,
}

impl ColorSample {
    /// Create a sample, clamping every channel into [0, 255].
    /// Non-finite channels are treated as 0.
    pub fn new(red: f64, green: f64, blue: f64) -> Self {
        Self {
            red: clamp_channel(red),
            green: clamp_channel(green),
            blue: clamp_channel(blue),
        }
    }

    /// Create a sample from 8-bit channel values
    pub fn from_rgb8(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red: red as f64,
            green: green as f64,
            blue: blue as f64,
        }
    }

    /// Largest channel value
    pub fn max_channel(&self) -> f64 {
        self.red.max(self.green).max(self.blue)
    }

    /// Smallest channel value
    pub fn min_channel(&self) -> f64 {
        self.red.min(self.green).min(self.blue)
    }
}

fn clamp_channel(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, CHANNEL_MAX)
    } else {
        0.0
    }
}

/// Hue/saturation/value triple derived from a [`ColorSample`]
///
/// `hue` lies in [0, 1), `saturation` and `value` in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HsvSample {
    pub hue: f64,
    pub saturation: f64,
    pub value: f64,
}

impl HsvSample {
    pub fn new(hue: f64, saturation: f64, value: f64) -> Self {
        Self { hue, saturation, value }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_clamping() {
        let sample = ColorSample::new(-4.0, 300.0, 128.5);
        assert_eq!(sample.red, 0.0);
        assert_eq!(sample.green, 255.0);
        assert_eq!(sample.blue, 128.5);
    }

    #[test]
    fn test_non_finite_channels() {
        let sample = ColorSample::new(f64::NAN, f64::INFINITY, 10.0);
        assert_eq!(sample.red, 0.0);
        assert_eq!(sample.green, 0.0);
        assert_eq!(sample.blue, 10.0);
    }

    #[test]
    fn test_min_max_channel() {
        let sample = ColorSample::from_rgb8(200, 30, 90);
        assert_eq!(sample.max_channel(), 200.0);
        assert_eq!(sample.min_channel(), 30.0);
    }
}
