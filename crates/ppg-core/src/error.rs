//! Error handling for the PPG workspace
//!
//! Nothing in the per-frame path is fatal: errors either reject a
//! configuration up front or cause a single frame to be dropped.

use core::fmt;

/// Result type alias for PPG operations
pub type PpgResult<T> = Result<T, PpgError>;

/// Error type for all PPG operations
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum PpgError {
    /// Configuration rejected by validation
    InvalidConfig {
        /// Description of the configuration error
        reason: String,
    },

    /// The frame's image buffer could not be read; the frame is dropped
    BufferUnavailable {
        /// What was wrong with the buffer
        reason: String,
    },

    /// Timestamp validation error
    InvalidTimestamp {
        /// Description of timestamp issue
        reason: &'static str,
    },

    /// Serialization/deserialization error
    Serialization {
        /// Serialization error description
        reason: String,
    },
}

impl PpgError {
    /// Shorthand for a configuration error
    pub fn config(reason: impl Into<String>) -> Self {
        PpgError::InvalidConfig { reason: reason.into() }
    }

    /// Shorthand for an unreadable frame buffer
    pub fn buffer(reason: impl Into<String>) -> Self {
        PpgError::BufferUnavailable { reason: reason.into() }
    }

    /// True when the error only affects the current frame
    pub fn is_transient(&self) -> bool {
        matches!(self, PpgError::BufferUnavailable { .. })
    }
}

impl fmt::Display for PpgError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PpgError::InvalidConfig { reason } => {
                write!(f, "Invalid configuration: {}", reason)
            }
            PpgError::BufferUnavailable { reason } => {
                write!(f, "Frame buffer unavailable: {}", reason)
            }
            PpgError::InvalidTimestamp { reason } => {
                write!(f, "Invalid timestamp: {}", reason)
            }
            PpgError::Serialization { reason } => {
                write!(f, "Serialization error: {}", reason)
            }
        }
    }
}

impl std::error::Error for PpgError {}

/// Convenience macro for creating configuration errors
#[macro_export]
macro_rules! config_error {
    ($($arg:tt)+) => {
        $crate::error::PpgError::InvalidConfig {
            reason: format!($($arg)+),
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = PpgError::buffer("expected 64 bytes, got 12");
        let display = format!("{}", error);
        assert!(display.contains("Frame buffer unavailable"));
        assert!(display.contains("64"));
        assert!(display.contains("12"));
    }

    #[test]
    fn test_error_equality() {
        let error1 = PpgError::config("test");
        let error2 = PpgError::InvalidConfig { reason: "test".to_string() };
        assert_eq!(error1, error2);
    }

    #[test]
    fn test_config_error_macro() {
        let error = config_error!("cutoff {} Hz above Nyquist", 20.0);
        assert_eq!(error, PpgError::config("cutoff 20 Hz above Nyquist"));
    }

    #[test]
    fn test_transient_classification() {
        assert!(PpgError::buffer("empty").is_transient());
        assert!(!PpgError::config("bad").is_transient());
    }
}
