//! Nanosecond timestamps for frame timing
//!
//! Frames carry a monotonic capture time that drives beat-interval
//! measurement; results are stamped with wall-clock time from a
//! [`TimestampProvider`].

use crate::error::{PpgError, PpgResult};
use core::fmt;
use core::ops::{Add, Sub};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Timestamp with nanosecond resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct PrecisionTimestamp {
    nanos: u64,
}

impl PrecisionTimestamp {
    #[inline]
    pub const fn from_nanos(nanos: u64) -> Self {
        Self { nanos }
    }

    #[inline]
    pub const fn from_micros(micros: u64) -> Self {
        Self { nanos: micros * 1_000 }
    }

    #[inline]
    pub const fn from_millis(millis: u64) -> Self {
        Self { nanos: millis * 1_000_000 }
    }

    #[inline]
    pub const fn from_secs(secs: u64) -> Self {
        Self { nanos: secs * 1_000_000_000 }
    }

    /// Create from fractional seconds; negative or non-finite input maps to zero
    pub fn from_secs_f64(secs: f64) -> Self {
        if secs.is_finite() && secs > 0.0 {
            Self { nanos: (secs * 1_000_000_000.0).round() as u64 }
        } else {
            Self { nanos: 0 }
        }
    }

    #[inline]
    pub const fn as_nanos(&self) -> u64 {
        self.nanos
    }

    #[inline]
    pub const fn as_millis(&self) -> u64 {
        self.nanos / 1_000_000
    }

    /// Get fractional seconds as f64
    #[inline]
    pub fn as_secs_f64(&self) -> f64 {
        self.nanos as f64 / 1_000_000_000.0
    }

    /// Calculate duration since another timestamp
    pub fn duration_since(&self, earlier: PrecisionTimestamp) -> PpgResult<Duration> {
        self.nanos
            .checked_sub(earlier.nanos)
            .map(Duration::from_nanos)
            .ok_or(PpgError::InvalidTimestamp {
                reason: "timestamp is earlier than reference",
            })
    }
}

impl fmt::Display for PrecisionTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let secs = self.nanos / 1_000_000_000;
        let subsec_nanos = self.nanos % 1_000_000_000;
        write!(f, "{}.{:09}", secs, subsec_nanos)
    }
}

/// Duration type with nanosecond precision
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Duration {
    nanos: u64,
}

impl Duration {
    #[inline]
    pub const fn from_nanos(nanos: u64) -> Self {
        Self { nanos }
    }

    #[inline]
    pub const fn from_millis(millis: u64) -> Self {
        Self { nanos: millis * 1_000_000 }
    }

    /// Duration of one frame at `frame_rate_hz`
    pub fn from_frame_rate(frame_rate_hz: f64) -> Self {
        if frame_rate_hz.is_finite() && frame_rate_hz > 0.0 {
            Self { nanos: (1_000_000_000.0 / frame_rate_hz).round() as u64 }
        } else {
            Self { nanos: 0 }
        }
    }

    #[inline]
    pub const fn as_nanos(&self) -> u64 {
        self.nanos
    }

    #[inline]
    pub const fn as_micros(&self) -> u64 {
        self.nanos / 1_000
    }

    #[inline]
    pub fn as_secs_f64(&self) -> f64 {
        self.nanos as f64 / 1_000_000_000.0
    }
}

impl Add for Duration {
    type Output = Duration;

    #[inline]
    fn add(self, other: Duration) -> Duration {
        Duration::from_nanos(self.nanos + other.nanos)
    }
}

impl Sub for Duration {
    type Output = Duration;

    #[inline]
    fn sub(self, other: Duration) -> Duration {
        Duration::from_nanos(self.nanos.saturating_sub(other.nanos))
    }
}

/// Source of wall-clock time for frame results
pub trait TimestampProvider: Send + Sync {
    /// Current time since the Unix epoch
    fn now(&self) -> PpgResult<PrecisionTimestamp>;
}

/// Wall-clock provider backed by the system clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimestampProvider;

impl TimestampProvider for SystemTimestampProvider {
    fn now(&self) -> PpgResult<PrecisionTimestamp> {
        use std::time::{SystemTime, UNIX_EPOCH};

        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| PrecisionTimestamp::from_nanos(d.as_nanos() as u64))
            .map_err(|_| PpgError::InvalidTimestamp {
                reason: "system time before Unix epoch",
            })
    }
}

/// Manually advanced clock for deterministic tests and replays
#[derive(Debug, Default)]
pub struct ManualTimestampProvider {
    nanos: AtomicU64,
}

impl ManualTimestampProvider {
    pub fn new(initial: PrecisionTimestamp) -> Self {
        Self {
            nanos: AtomicU64::new(initial.as_nanos()),
        }
    }

    pub fn advance(&self, duration: Duration) {
        self.nanos.fetch_add(duration.as_nanos(), Ordering::Relaxed);
    }

    pub fn set(&self, timestamp: PrecisionTimestamp) {
        self.nanos.store(timestamp.as_nanos(), Ordering::Relaxed);
    }
}

impl TimestampProvider for ManualTimestampProvider {
    fn now(&self) -> PpgResult<PrecisionTimestamp> {
        Ok(PrecisionTimestamp::from_nanos(self.nanos.load(Ordering::Relaxed)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_creation() {
        let ts = PrecisionTimestamp::from_micros(1_500_000);
        assert_eq!(ts.as_millis(), 1_500);
        assert_eq!(ts.as_secs_f64(), 1.5);
    }

    #[test]
    fn test_from_secs_f64() {
        let ts = PrecisionTimestamp::from_secs_f64(2.25);
        assert_eq!(ts.as_nanos(), 2_250_000_000);
        assert_eq!(PrecisionTimestamp::from_secs_f64(-1.0).as_nanos(), 0);
        assert_eq!(PrecisionTimestamp::from_secs_f64(f64::NAN).as_nanos(), 0);
    }

    #[test]
    fn test_duration_calculation() {
        let ts1 = PrecisionTimestamp::from_secs(100);
        let ts2 = PrecisionTimestamp::from_millis(100_250);
        let duration = ts2.duration_since(ts1).unwrap();
        assert_eq!(duration.as_micros(), 250_000);
        assert!(ts1.duration_since(ts2).is_err());
    }

    #[test]
    fn test_frame_rate_duration() {
        let frame = Duration::from_frame_rate(30.0);
        assert_eq!(frame.as_nanos(), 33_333_333);
        assert_eq!(Duration::from_frame_rate(0.0).as_nanos(), 0);
    }

    #[test]
    fn test_duration_arithmetic() {
        let d1 = Duration::from_millis(5);
        let d2 = Duration::from_millis(3);
        assert_eq!((d1 + d2).as_micros(), 8_000);
        assert_eq!((d2 - d1).as_nanos(), 0);
    }

    #[test]
    fn test_manual_provider() {
        let clock = ManualTimestampProvider::new(PrecisionTimestamp::from_secs(10));
        clock.advance(Duration::from_millis(500));
        assert_eq!(clock.now().unwrap().as_secs_f64(), 10.5);

        clock.set(PrecisionTimestamp::from_secs(1));
        assert_eq!(clock.now().unwrap().as_millis(), 1_000);
    }

    #[test]
    fn test_system_provider_is_after_2020() {
        let now = SystemTimestampProvider.now().unwrap();
        assert!(now > PrecisionTimestamp::from_secs(1_577_836_800));
    }
}
