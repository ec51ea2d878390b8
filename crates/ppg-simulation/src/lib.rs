//! PPG-Simulation: synthetic camera frames for testing and demos
//!
//! Generates fingertip-on-lens frames whose hue follows a configurable pulse
//! pattern, with sensor noise, contact loss and dropped buffers.

pub mod frame_simulator;
pub mod real_time_stream;
pub mod signal_patterns;

pub use frame_simulator::*;
pub use real_time_stream::*;
pub use signal_patterns::*;
