//! RGB to HSV conversion

use ppg_core::{ColorSample, HsvSample};
use ppg_core::color::CHANNEL_MAX;

/// Convert a mean colour sample into hue/saturation/value.
///
/// Standard max/min/chroma formulation. Hue is normalised into [0, 1);
/// zero chroma (greys, black) yields hue 0 and black yields saturation 0.
pub fn rgb_to_hsv(color: ColorSample) -> HsvSample {
    let r = color.red / CHANNEL_MAX;
    let g = color.green / CHANNEL_MAX;
    let b = color.blue / CHANNEL_MAX;

    let max = color.max_channel() / CHANNEL_MAX;
    let min = color.min_channel() / CHANNEL_MAX;
    let chroma = max - min;

    let value = max;
    let saturation = if max > 0.0 { chroma / max } else { 0.0 };

    let hue = if chroma <= 0.0 {
        0.0
    } else {
        let sector = if max == r {
            ((g - b) / chroma).rem_euclid(6.0)
        } else if max == g {
            (b - r) / chroma + 2.0
        } else {
            (r - g) / chroma + 4.0
        };
        normalize_hue(sector / 6.0)
    };

    HsvSample::new(hue, saturation, value)
}

/// Inverse of [`rgb_to_hsv`], producing channels in [0, 255]
///
/// Used to synthesise frames with a prescribed hue.
pub fn hsv_to_rgb(hsv: HsvSample) -> ColorSample {
    let h = normalize_hue(hsv.hue) * 6.0;
    let s = hsv.saturation.clamp(0.0, 1.0);
    let v = hsv.value.clamp(0.0, 1.0);

    let sector = h.floor();
    let fraction = h - sector;
    let p = v * (1.0 - s);
    let q = v * (1.0 - s * fraction);
    let t = v * (1.0 - s * (1.0 - fraction));

    let (r, g, b) = match sector as u8 {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    };

    ColorSample::new(r * CHANNEL_MAX, g * CHANNEL_MAX, b * CHANNEL_MAX)
}

/// Wrap a hue into [0, 1)
fn normalize_hue(hue: f64) -> f64 {
    let wrapped = hue.rem_euclid(1.0);
    // rem_euclid can round up to exactly 1.0 for tiny negative inputs
    if wrapped >= 1.0 {
        0.0
    } else {
        wrapped
    }
}
