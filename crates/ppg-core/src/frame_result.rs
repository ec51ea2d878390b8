//! Per-frame output record

use crate::color::{ColorSample, HsvSample};
use crate::command::SessionMode;
use serde::{Deserialize, Serialize};

/// Result of processing one frame
///
/// Serialises with the field names hosts expect (`BPM`, `state`, `count`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameResult {
    pub hue: f64,
    pub saturation: f64,
    pub brightness: f64,
    /// Band-pass output; 0 during warm-up and on invalid frames
    pub filtered: f64,
    pub red: f64,
    pub green: f64,
    pub blue: f64,
    /// Wall-clock time, seconds since the Unix epoch
    pub time: f64,
    #[serde(rename = "BPM")]
    pub bpm: u32,
    #[serde(rename = "state")]
    pub mode: SessionMode,
    #[serde(rename = "count")]
    pub valid_frame_count: u32,
}

impl FrameResult {
    pub fn new(
        color: ColorSample,
        hsv: HsvSample,
        filtered: f64,
        time: f64,
        bpm: u32,
        mode: SessionMode,
        valid_frame_count: u32,
    ) -> Self {
        FrameResult {
            hue: hsv.hue,
            saturation: hsv.saturation,
            brightness: hsv.value,
            filtered,
            red: color.red,
            green: color.green,
            blue: color.blue,
            time,
            bpm,
            mode,
            valid_frame_count,
        }
    }

    /// True once a heart rate is being reported
    pub fn has_bpm(&self) -> bool {
        self.bpm > 0
    }
}
