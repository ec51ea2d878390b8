//! Frame buffer to mean colour reduction

use ppg_core::{ColorSample, FrameBuffer, PpgError, PpgResult};

/// Rows sampled by default, matching a typical downscaled preview frame
pub const DEFAULT_MAX_ROWS: usize = 100;

/// Reduces an image to the mean colour the pipeline consumes
pub trait ColorSampler: Send + Sync {
    fn sample(&self, buffer: &FrameBuffer) -> PpgResult<ColorSample>;
}

/// Averages all pixels of evenly spaced rows
///
/// Frames taller than `max_rows` are sampled with a row stride so large
/// camera images cost about the same as small ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AreaAverageSampler {
    max_rows: usize,
}

impl AreaAverageSampler {
    pub fn new(max_rows: usize) -> Self {
        Self { max_rows: max_rows.max(1) }
    }

    /// Sample every row
    pub fn full() -> Self {
        Self { max_rows: usize::MAX }
    }

    pub fn max_rows(&self) -> usize {
        self.max_rows
    }

    fn row_stride(&self, height: usize) -> usize {
        // Ceiling division keeps the sampled row count at or below max_rows
        height.div_ceil(self.max_rows).max(1)
    }
}

impl Default for AreaAverageSampler {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ROWS)
    }
}

impl ColorSampler for AreaAverageSampler {
    fn sample(&self, buffer: &FrameBuffer) -> PpgResult<ColorSample> {
        buffer.validate()?;

        let bpp = buffer.format.bytes_per_pixel();
        let stride = self.row_stride(buffer.height);

        let (mut red, mut green, mut blue) = (0u64, 0u64, 0u64);
        let mut pixels = 0u64;

        for y in (0..buffer.height).step_by(stride) {
            for pixel in buffer.row(y).chunks_exact(bpp) {
                let (r, g, b) = buffer.format.decode(pixel);
                red += r as u64;
                green += g as u64;
                blue += b as u64;
                pixels += 1;
            }
        }

        if pixels == 0 {
            return Err(PpgError::buffer("no pixels sampled"));
        }

        let n = pixels as f64;
        Ok(ColorSample::new(red as f64 / n, green as f64 / n, blue as f64 / n))
    }
}
