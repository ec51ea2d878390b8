//! Host integration for the PPG pipeline
//!
//! [`HeartRatePlugin`] is the per-frame entry point a camera host calls;
//! [`HeartRateService`] drives the plugin from a stream of frames.

pub mod plugin;
pub mod sampler;
pub mod service;

pub use plugin::{command_from_arguments, HeartRatePlugin};
pub use sampler::{AreaAverageSampler, ColorSampler, DEFAULT_MAX_ROWS};
pub use service::{HeartRateService, ServiceCommand, ServiceStats};
