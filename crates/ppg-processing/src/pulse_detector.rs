//! Beat detection and inter-beat interval averaging

use crate::config::DetectorConfig;
use ppg_core::PpgResult;
use std::collections::VecDeque;
use tracing::debug;

/// Classification of a sample against the adaptive thresholds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PulseDirection {
    /// Above the upper threshold
    Up,
    /// Below the lower threshold
    Down,
    /// Between the thresholds, or inside the noise floor
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct BeatInterval {
    /// Seconds between two consecutive beats
    period: f64,
    /// Time of the beat that closed the interval
    at: f64,
}

/// Hysteresis beat detector over the filtered hue signal
///
/// A beat is an upward crossing of `hysteresis * mean(recent positive
/// samples)` after the signal has dropped below `-hysteresis * mean(recent
/// negative magnitudes)`. Intervals between beats outside
/// `(min_period_s, max_period_s)` are discarded; the reported average is the
/// mean of recent intervals after rejecting those far from the median.
#[derive(Debug, Clone)]
pub struct PulseDetector {
    config: DetectorConfig,
    positive: VecDeque<f64>,
    negative: VecDeque<f64>,
    armed: bool,
    last_beat: Option<f64>,
    intervals: VecDeque<BeatInterval>,
    latest_time: Option<f64>,
}

impl PulseDetector {
    /// Build a detector, rejecting configurations that cannot hold a window
    pub fn new(config: DetectorConfig) -> PpgResult<Self> {
        config.validate()?;
        Ok(PulseDetector {
            positive: VecDeque::with_capacity(config.amplitude_window),
            negative: VecDeque::with_capacity(config.amplitude_window),
            intervals: VecDeque::with_capacity(config.max_periods),
            config,
            armed: false,
            last_beat: None,
            latest_time: None,
        })
    }

    /// Feed one filtered sample taken at `at_secs` (monotonic seconds)
    pub fn add_value(&mut self, value: f64, at_secs: f64) -> PulseDirection {
        self.latest_time = Some(at_secs);

        if value > 0.0 {
            push_bounded(&mut self.positive, value, self.config.amplitude_window);
        } else if value < 0.0 {
            push_bounded(&mut self.negative, -value, self.config.amplitude_window);
        }

        let upper = (self.config.hysteresis * mean(&self.positive)).max(self.config.noise_floor);
        let lower = (self.config.hysteresis * mean(&self.negative)).max(self.config.noise_floor);

        let is_down = value < -lower;
        let is_up = value >= upper && value > self.config.noise_floor;

        if is_down {
            self.armed = true;
        }

        if is_up && self.armed {
            self.armed = false;
            self.register_beat(at_secs);
        }

        if is_down {
            PulseDirection::Down
        } else if is_up {
            PulseDirection::Up
        } else {
            PulseDirection::Neutral
        }
    }

    fn register_beat(&mut self, at: f64) {
        if let Some(previous) = self.last_beat {
            let period = at - previous;
            if period > self.config.min_period_s && period < self.config.max_period_s {
                push_bounded(&mut self.intervals, BeatInterval { period, at }, self.config.max_periods);
                debug!(period, at, "beat interval accepted");
            } else {
                debug!(period, at, "beat interval outside physiological range");
            }
        }
        self.last_beat = Some(at);
    }

    /// Average inter-beat interval in seconds, or `None` until enough
    /// recent intervals have been observed
    pub fn average_period(&self) -> Option<f64> {
        let latest = self.latest_time?;

        let recent: Vec<f64> = self
            .intervals
            .iter()
            .filter(|interval| latest - interval.at < self.config.period_horizon_s)
            .map(|interval| interval.period)
            .collect();

        if recent.len() < self.config.min_periods {
            return None;
        }

        let median = median(&recent)?;
        let tolerance = self.config.outlier_tolerance * median;
        let (sum, count) = recent
            .iter()
            .filter(|&&period| (period - median).abs() <= tolerance)
            .fold((0.0, 0usize), |(sum, count), &period| (sum + period, count + 1));

        if count == 0 {
            None
        } else {
            Some(sum / count as f64)
        }
    }

    /// Heart rate derived from the average interval; 0 while undefined
    pub fn bpm(&self) -> u32 {
        self.average_period()
            .filter(|&period| period > 0.0)
            .map(|period| (60.0 / period).round() as u32)
            .unwrap_or(0)
    }

    /// Number of accepted intervals currently held
    pub fn interval_count(&self) -> usize {
        self.intervals.len()
    }

    /// Clear all history
    pub fn reset(&mut self) {
        self.positive.clear();
        self.negative.clear();
        self.intervals.clear();
        self.armed = false;
        self.last_beat = None;
        self.latest_time = None;
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }
}

fn push_bounded<T>(buffer: &mut VecDeque<T>, value: T, capacity: usize) {
    if buffer.len() == capacity {
        buffer.pop_front();
    }
    buffer.push_back(value);
}

fn mean(values: &VecDeque<f64>) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}
