//! Finger-presence gate

use crate::config::PresenceConfig;
use ppg_core::HsvSample;

/// Classification of a frame's colour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    /// Finger on the lens, well exposed
    Valid,
    /// Ambient scene or finger lifted
    Invalid,
}

impl Presence {
    pub fn is_valid(&self) -> bool {
        matches!(self, Presence::Valid)
    }
}

/// Saturation/brightness threshold gate
///
/// A finger pressed against a lit lens produces a saturated, bright image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PresenceGate {
    config: PresenceConfig,
}

impl PresenceGate {
    pub fn new(config: PresenceConfig) -> Self {
        Self { config }
    }

    pub fn classify(&self, hsv: &HsvSample) -> Presence {
        if hsv.saturation > self.config.min_saturation && hsv.value > self.config.min_value {
            Presence::Valid
        } else {
            Presence::Invalid
        }
    }

    pub fn config(&self) -> &PresenceConfig {
        &self.config
    }
}

impl Default for PresenceGate {
    fn default() -> Self {
        Self::new(PresenceConfig::default())
    }
}
