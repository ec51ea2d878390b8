//! PPG-Core: Foundation types for camera photoplethysmography
//!
//! Colour samples, frame buffers, per-frame results and the shared error type
//! used by every crate in the workspace.

pub mod color;
pub mod command;
pub mod error;
pub mod frame;
pub mod frame_result;
pub mod session_id;
pub mod timestamp;

pub use color::{ColorSample, HsvSample};
pub use command::{FrameCommand, SessionMode};
pub use error::{PpgError, PpgResult};
pub use frame::{CameraFrame, FrameBuffer, PixelFormat};
pub use frame_result::FrameResult;
pub use session_id::SessionId;
pub use timestamp::{
    Duration, ManualTimestampProvider, PrecisionTimestamp, SystemTimestampProvider,
    TimestampProvider,
};
