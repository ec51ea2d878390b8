//! Camera frames as delivered by the host

use crate::color::ColorSample;
use crate::error::{PpgError, PpgResult};
use crate::timestamp::PrecisionTimestamp;
use serde::{Deserialize, Serialize};

/// Packed 8-bit pixel layouts understood by the samplers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PixelFormat {
    Rgba8,
    Bgra8,
    Rgb8,
}

impl PixelFormat {
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            PixelFormat::Rgba8 | PixelFormat::Bgra8 => 4,
            PixelFormat::Rgb8 => 3,
        }
    }

    /// Decode one pixel; `pixel` must hold at least `bytes_per_pixel` bytes
    #[inline]
    pub fn decode(&self, pixel: &[u8]) -> (u8, u8, u8) {
        match self {
            PixelFormat::Rgba8 | PixelFormat::Rgb8 => (pixel[0], pixel[1], pixel[2]),
            PixelFormat::Bgra8 => (pixel[2], pixel[1], pixel[0]),
        }
    }
}

/// Owned image buffer
#[derive(Debug, Clone, PartialEq)]
pub struct FrameBuffer {
    pub width: usize,
    pub height: usize,
    pub format: PixelFormat,
    pub data: Vec<u8>,
}

impl FrameBuffer {
    /// Create a buffer, checking that `data` matches the declared geometry
    pub fn new(width: usize, height: usize, format: PixelFormat, data: Vec<u8>) -> PpgResult<Self> {
        let buffer = FrameBuffer { width, height, format, data };
        buffer.validate()?;
        Ok(buffer)
    }

    /// Buffer where every pixel has the same colour
    pub fn filled(width: usize, height: usize, format: PixelFormat, color: ColorSample) -> Self {
        let (r, g, b) = (
            color.red.round() as u8,
            color.green.round() as u8,
            color.blue.round() as u8,
        );
        let pixel: Vec<u8> = match format {
            PixelFormat::Rgba8 => vec![r, g, b, 255],
            PixelFormat::Bgra8 => vec![b, g, r, 255],
            PixelFormat::Rgb8 => vec![r, g, b],
        };
        let data = pixel
            .iter()
            .copied()
            .cycle()
            .take(width * height * format.bytes_per_pixel())
            .collect();

        FrameBuffer { width, height, format, data }
    }

    /// Expected byte length for the declared geometry, `None` on overflow
    pub fn expected_len(&self) -> Option<usize> {
        self.width
            .checked_mul(self.height)?
            .checked_mul(self.format.bytes_per_pixel())
    }

    pub fn pixel_count(&self) -> usize {
        self.width * self.height
    }

    /// Check that the buffer can be decoded
    pub fn validate(&self) -> PpgResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(PpgError::buffer(format!(
                "empty image {}x{}",
                self.width, self.height
            )));
        }
        let expected = self
            .expected_len()
            .ok_or_else(|| PpgError::buffer("image dimensions overflow"))?;
        if self.data.len() != expected {
            return Err(PpgError::buffer(format!(
                "expected {} bytes for {}x{} {:?}, got {}",
                expected,
                self.width,
                self.height,
                self.format,
                self.data.len()
            )));
        }
        Ok(())
    }

    /// Bytes of row `y`; the buffer must have passed [`validate`](Self::validate)
    pub fn row(&self, y: usize) -> &[u8] {
        let stride = self.width * self.format.bytes_per_pixel();
        &self.data[y * stride..(y + 1) * stride]
    }
}

/// One frame from the camera: an optional image plus its capture time
///
/// `buffer` is `None` when the host could not obtain an image for the frame.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraFrame {
    pub buffer: Option<FrameBuffer>,
    /// Monotonic capture time
    pub timestamp: PrecisionTimestamp,
}

impl CameraFrame {
    pub fn new(buffer: FrameBuffer, timestamp: PrecisionTimestamp) -> Self {
        Self { buffer: Some(buffer), timestamp }
    }

    pub fn unavailable(timestamp: PrecisionTimestamp) -> Self {
        Self { buffer: None, timestamp }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filled_buffer_layout() {
        let color = ColorSample::from_rgb8(10, 20, 30);
        let rgba = FrameBuffer::filled(2, 2, PixelFormat::Rgba8, color);
        assert_eq!(rgba.data.len(), 16);
        assert_eq!(&rgba.data[..4], &[10, 20, 30, 255]);
        assert!(rgba.validate().is_ok());

        let bgra = FrameBuffer::filled(1, 1, PixelFormat::Bgra8, color);
        assert_eq!(bgra.data, vec![30, 20, 10, 255]);
        assert_eq!(PixelFormat::Bgra8.decode(&bgra.data), (10, 20, 30));
    }

    #[test]
    fn test_validation_rejects_bad_geometry() {
        assert!(FrameBuffer::new(0, 4, PixelFormat::Rgb8, vec![]).is_err());

        let err = FrameBuffer::new(2, 2, PixelFormat::Rgb8, vec![0; 11]).unwrap_err();
        assert!(err.is_transient());
        assert!(err.to_string().contains("expected 12 bytes"));

        let oversized = FrameBuffer {
            width: usize::MAX / 2,
            height: 4,
            format: PixelFormat::Rgba8,
            data: vec![0; 8],
        };
        assert_eq!(oversized.expected_len(), None);
        let err = oversized.validate().unwrap_err();
        assert!(err.is_transient());
        assert!(err.to_string().contains("overflow"));
    }

    #[test]
    fn test_row_access() {
        let data: Vec<u8> = (0..12).collect();
        let buffer = FrameBuffer::new(2, 2, PixelFormat::Rgb8, data).unwrap();
        assert_eq!(buffer.row(1), &[6, 7, 8, 9, 10, 11]);
    }
}
