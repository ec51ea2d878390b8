//! Signal processing for camera-based heart-rate measurement
//!
//! Each frame's mean colour is converted to HSV, gated on finger presence,
//! band-pass filtered and fed to a beat detector. [`PulseSession`] ties the
//! stages together.

pub mod color_space;
pub mod config;
pub mod filters;
pub mod presence;
pub mod processor;
pub mod pulse_detector;
pub mod session;

pub use color_space::{hsv_to_rgb, rgb_to_hsv};
pub use config::{BandPassConfig, CameraProfile, DetectorConfig, PresenceConfig, PulseConfig};
pub use filters::{BandPassFilter, BiquadStage, FilterType};
pub use presence::{Presence, PresenceGate};
pub use processor::SampleProcessor;
pub use pulse_detector::{PulseDetector, PulseDirection};
pub use session::PulseSession;
