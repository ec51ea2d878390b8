//! Configuration management for the pulse pipeline

use ppg_core::{config_error, PpgError, PpgResult};
use serde::{Deserialize, Serialize};

/// Frame rate most phone cameras deliver by default
pub const DEFAULT_FRAME_RATE_HZ: f64 = 30.0;

/// Valid frames discarded before a heart rate is reported
pub const DEFAULT_WARMUP_FRAMES: u32 = 60;

/// Complete pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PulseConfig {
    /// Configuration name/profile
    pub name: String,
    /// Camera profile the constants were chosen for
    pub profile: CameraProfile,
    /// Valid frames to accumulate before filtering starts
    pub warmup_frames: u32,
    pub presence: PresenceConfig,
    pub filter: BandPassConfig,
    pub detector: DetectorConfig,
}

/// Camera profiles for different frame rates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CameraProfile {
    /// 30 fps
    Standard,
    /// 24 fps
    LowFrameRate,
    /// 60 fps
    HighFrameRate,
    /// Hand-tuned constants
    Custom,
}

/// Finger-presence thresholds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PresenceConfig {
    /// Saturation must be strictly above this
    pub min_saturation: f64,
    /// Value (brightness) must be strictly above this
    pub min_value: f64,
}

/// Band-pass filter design parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandPassConfig {
    /// Nominal frame rate the filter is designed for (Hz)
    pub frame_rate_hz: f64,
    /// High-pass corner removing baseline drift (Hz)
    pub highpass_cutoff_hz: f64,
    /// Low-pass corner removing sensor noise (Hz)
    pub lowpass_cutoff_hz: f64,
}

/// Pulse detector tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Recent positive/negative samples kept for the adaptive thresholds
    pub amplitude_window: usize,
    /// Fraction of the mean amplitude a sample must reach to cross
    pub hysteresis: f64,
    /// Samples with magnitude at or below this never cross
    pub noise_floor: f64,
    /// Intervals at or below this are rejected (seconds)
    pub min_period_s: f64,
    /// Intervals at or above this are rejected (seconds)
    pub max_period_s: f64,
    /// Intervals retained for averaging
    pub max_periods: usize,
    /// Intervals required before an average is reported
    pub min_periods: usize,
    /// Intervals older than this, relative to the latest sample, are ignored (seconds)
    pub period_horizon_s: f64,
    /// Maximum relative deviation from the median interval kept in the average
    pub outlier_tolerance: f64,
}

impl Default for PresenceConfig {
    fn default() -> Self {
        PresenceConfig {
            min_saturation: 0.5,
            min_value: 0.5,
        }
    }
}

impl Default for BandPassConfig {
    fn default() -> Self {
        BandPassConfig {
            frame_rate_hz: DEFAULT_FRAME_RATE_HZ,
            highpass_cutoff_hz: 0.5,
            lowpass_cutoff_hz: 4.0,
        }
    }
}

impl Default for DetectorConfig {
    fn default() -> Self {
        DetectorConfig {
            amplitude_window: 20,
            hysteresis: 0.5,
            noise_floor: 1e-6,
            min_period_s: 0.3,
            max_period_s: 1.5,
            max_periods: 20,
            min_periods: 3,
            period_horizon_s: 10.0,
            outlier_tolerance: 0.35,
        }
    }
}

impl PulseConfig {
    /// Defaults for a 30 fps camera
    pub fn standard() -> Self {
        PulseConfig {
            name: "Standard 30 fps".to_string(),
            profile: CameraProfile::Standard,
            warmup_frames: DEFAULT_WARMUP_FRAMES,
            presence: PresenceConfig::default(),
            filter: BandPassConfig::default(),
            detector: DetectorConfig::default(),
        }
    }

    /// Defaults with the filter designed for another frame rate
    pub fn for_frame_rate(frame_rate_hz: f64) -> Self {
        let mut config = Self::standard();
        config.name = format!("{} fps", frame_rate_hz);
        config.profile = CameraProfile::Custom;
        config.filter.frame_rate_hz = frame_rate_hz;
        config
    }

    /// Create configuration suitable for given profile
    pub fn for_profile(profile: CameraProfile) -> Self {
        let mut config = match profile {
            CameraProfile::Standard | CameraProfile::Custom => Self::standard(),
            CameraProfile::LowFrameRate => Self::for_frame_rate(24.0),
            CameraProfile::HighFrameRate => Self::for_frame_rate(60.0),
        };
        config.profile = profile;
        config
    }

    /// Validate entire configuration
    pub fn validate(&self) -> PpgResult<()> {
        let presence = &self.presence;
        for (name, threshold) in [
            ("min_saturation", presence.min_saturation),
            ("min_value", presence.min_value),
        ] {
            if !(0.0..1.0).contains(&threshold) {
                return Err(config_error!("{} must be in [0, 1), got {}", name, threshold));
            }
        }

        self.filter.validate()?;
        self.detector.validate()
    }

    /// Export configuration to JSON
    pub fn to_json(&self) -> PpgResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| PpgError::Serialization {
            reason: format!("Failed to serialize configuration: {}", e),
        })
    }

    /// Import configuration from JSON and validate it
    pub fn from_json(json: &str) -> PpgResult<Self> {
        let config: PulseConfig = serde_json::from_str(json).map_err(|e| PpgError::Serialization {
            reason: format!("Failed to deserialize configuration: {}", e),
        })?;
        config.validate()?;
        Ok(config)
    }
}

impl BandPassConfig {
    pub fn nyquist_hz(&self) -> f64 {
        self.frame_rate_hz / 2.0
    }

    pub fn validate(&self) -> PpgResult<()> {
        if !(self.frame_rate_hz.is_finite() && self.frame_rate_hz > 0.0) {
            return Err(config_error!("Frame rate must be positive, got {}", self.frame_rate_hz));
        }
        if self.highpass_cutoff_hz <= 0.0 {
            return Err(config_error!("High-pass cutoff must be positive"));
        }
        if self.highpass_cutoff_hz >= self.lowpass_cutoff_hz {
            return Err(config_error!(
                "High-pass cutoff {} Hz must be below low-pass cutoff {} Hz",
                self.highpass_cutoff_hz,
                self.lowpass_cutoff_hz
            ));
        }
        if self.lowpass_cutoff_hz >= self.nyquist_hz() {
            return Err(config_error!(
                "Low-pass cutoff {} Hz must be below Nyquist frequency {} Hz",
                self.lowpass_cutoff_hz,
                self.nyquist_hz()
            ));
        }
        Ok(())
    }
}

impl DetectorConfig {
    pub fn validate(&self) -> PpgResult<()> {
        if self.amplitude_window == 0 {
            return Err(config_error!("Amplitude window must be greater than 0"));
        }
        if !(self.hysteresis > 0.0 && self.hysteresis <= 1.0) {
            return Err(config_error!("Hysteresis must be in (0, 1], got {}", self.hysteresis));
        }
        if self.noise_floor < 0.0 {
            return Err(config_error!("Noise floor cannot be negative"));
        }
        if !(self.min_period_s > 0.0 && self.min_period_s < self.max_period_s) {
            return Err(config_error!(
                "Period bounds must satisfy 0 < min ({}) < max ({})",
                self.min_period_s,
                self.max_period_s
            ));
        }
        if self.min_periods == 0 || self.min_periods > self.max_periods {
            return Err(config_error!(
                "min_periods ({}) must be in 1..={}",
                self.min_periods,
                self.max_periods
            ));
        }
        if self.period_horizon_s <= self.max_period_s {
            return Err(config_error!("Period horizon must exceed the maximum period"));
        }
        if self.outlier_tolerance <= 0.0 {
            return Err(config_error!("Outlier tolerance must be positive"));
        }
        Ok(())
    }

    /// Beats per minute corresponding to the accepted period range
    pub fn bpm_range(&self) -> (f64, f64) {
        (60.0 / self.max_period_s, 60.0 / self.min_period_s)
    }
}

impl Default for PulseConfig {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_config() {
        let config = PulseConfig::standard();
        assert_eq!(config.profile, CameraProfile::Standard);
        assert_eq!(config.warmup_frames, 60);
        assert_eq!(config.presence.min_saturation, 0.5);
        assert_eq!(config.presence.min_value, 0.5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_profile_creation() {
        let low = PulseConfig::for_profile(CameraProfile::LowFrameRate);
        assert_eq!(low.profile, CameraProfile::LowFrameRate);
        assert_eq!(low.filter.frame_rate_hz, 24.0);
        assert!(low.validate().is_ok());

        let high = PulseConfig::for_profile(CameraProfile::HighFrameRate);
        assert_eq!(high.filter.frame_rate_hz, 60.0);
        assert!(high.validate().is_ok());
    }

    #[test]
    fn test_filter_validation() {
        let mut config = PulseConfig::standard();

        config.filter.lowpass_cutoff_hz = 20.0; // above Nyquist at 30 fps
        assert!(config.validate().is_err());

        config.filter.lowpass_cutoff_hz = 0.4; // below the high-pass corner
        assert!(config.validate().is_err());

        config.filter.lowpass_cutoff_hz = 4.0;
        config.filter.frame_rate_hz = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_detector_validation() {
        let mut config = PulseConfig::standard();
        config.detector.min_period_s = 2.0;
        assert!(config.validate().is_err());

        let mut config = PulseConfig::standard();
        config.detector.min_periods = 0;
        assert!(config.validate().is_err());

        let mut config = PulseConfig::standard();
        config.detector.hysteresis = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_presence_validation() {
        let mut config = PulseConfig::standard();
        config.presence.min_value = 1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bpm_range() {
        let (low, high) = DetectorConfig::default().bpm_range();
        assert_eq!(low, 40.0);
        assert_eq!(high, 200.0);
    }

    #[test]
    fn test_json_serialization() {
        let config = PulseConfig::for_profile(CameraProfile::HighFrameRate);

        let json = config.to_json().unwrap();
        assert!(json.contains("HighFrameRate"));

        let restored = PulseConfig::from_json(&json).unwrap();
        assert_eq!(restored, config);
    }

    #[test]
    fn test_json_rejects_invalid() {
        let mut config = PulseConfig::standard();
        config.warmup_frames = 10;
        config.filter.highpass_cutoff_hz = 5.0;
        let json = serde_json::to_string(&config).unwrap();
        assert!(matches!(
            PulseConfig::from_json(&json),
            Err(PpgError::InvalidConfig { .. })
        ));
        assert!(matches!(
            PulseConfig::from_json("{ not json"),
            Err(PpgError::Serialization { .. })
        ));
    }
}
