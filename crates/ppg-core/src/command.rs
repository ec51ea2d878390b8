//! Typed per-frame command and session mode

use core::fmt;
use serde::{Deserialize, Serialize};

/// Command accompanying a frame
///
/// Hosts historically pass a positional string flag; it is converted to this
/// enum at the boundary so the core never sees loosely typed arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FrameCommand {
    /// Process the frame normally
    #[default]
    None,
    /// Reset the session before processing the frame
    Reset,
}

impl FrameCommand {
    /// Interpret a host flag. Only the exact string `"true"` requests a reset;
    /// any other value, or no value, is [`FrameCommand::None`].
    pub fn from_flag(flag: Option<&str>) -> Self {
        match flag {
            Some("true") => FrameCommand::Reset,
            _ => FrameCommand::None,
        }
    }

    pub fn is_reset(&self) -> bool {
        matches!(self, FrameCommand::Reset)
    }
}

impl From<bool> for FrameCommand {
    fn from(reset: bool) -> Self {
        if reset {
            FrameCommand::Reset
        } else {
            FrameCommand::None
        }
    }
}

/// Detection session state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SessionMode {
    /// Initial state, entered again on every reset
    #[default]
    #[serde(rename = "BEGIN")]
    Begin,
    /// A finger is on the lens and frames are being accumulated
    #[serde(rename = "RECORDING")]
    Recording,
}

impl SessionMode {
    /// Label reported to hosts
    pub fn label(&self) -> &'static str {
        match self {
            SessionMode::Begin => "BEGIN",
            SessionMode::Recording => "RECORDING",
        }
    }
}

impl fmt::Display for SessionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_parsing() {
        assert_eq!(FrameCommand::from_flag(Some("true")), FrameCommand::Reset);
        assert_eq!(FrameCommand::from_flag(Some("false")), FrameCommand::None);
        assert_eq!(FrameCommand::from_flag(Some("TRUE")), FrameCommand::None);
        assert_eq!(FrameCommand::from_flag(Some("")), FrameCommand::None);
        assert_eq!(FrameCommand::from_flag(None), FrameCommand::None);
    }

    #[test]
    fn test_from_bool() {
        assert!(FrameCommand::from(true).is_reset());
        assert!(!FrameCommand::from(false).is_reset());
    }

    #[test]
    fn test_mode_labels() {
        assert_eq!(SessionMode::Begin.to_string(), "BEGIN");
        assert_eq!(SessionMode::Recording.label(), "RECORDING");
        assert_eq!(SessionMode::default(), SessionMode::Begin);
    }
}
