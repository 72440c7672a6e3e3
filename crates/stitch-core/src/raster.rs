//! Input images and scaled copies used during the overlap search.

use image::RgbaImage;
use image::imageops::{self, FilterType};
use tracing::debug;

use crate::{Result, StitchError};

/// One decoded input image. Immutable once constructed.
#[derive(Debug, Clone)]
pub struct Image {
    index: usize,
    buffer: RgbaImage,
}

impl Image {
    /// Build an image from a row-major RGBA byte buffer.
    ///
    /// Fails when either dimension is zero or the buffer length is not
    /// `width * height * 4`.
    pub fn from_rgba(index: usize, width: u32, height: u32, pixels: Vec<u8>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(StitchError::EmptyImage { index });
        }
        let expected = width as usize * height as usize * 4;
        let actual = pixels.len();
        let buffer = RgbaImage::from_raw(width, height, pixels).ok_or(StitchError::BufferSize {
            index,
            expected,
            actual,
        })?;
        // from_raw accepts oversized buffers
        if actual != expected {
            return Err(StitchError::BufferSize {
                index,
                expected,
                actual,
            });
        }
        Ok(Self { index, buffer })
    }

    /// Wrap an existing RGBA buffer.
    pub fn from_buffer(index: usize, buffer: RgbaImage) -> Result<Self> {
        if buffer.width() == 0 || buffer.height() == 0 {
            return Err(StitchError::EmptyImage { index });
        }
        Ok(Self { index, buffer })
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn width(&self) -> u32 {
        self.buffer.width()
    }

    pub fn height(&self) -> u32 {
        self.buffer.height()
    }

    pub fn buffer(&self) -> &RgbaImage {
        &self.buffer
    }

    pub fn pixels(&self) -> &[u8] {
        self.buffer.as_raw()
    }

    /// Dimensions after applying `scale`, rounded to whole pixels (at least 1).
    pub fn scaled_dimensions(&self, scale: f64) -> (u32, u32) {
        scaled_dimensions(self.width(), self.height(), scale)
    }

    /// Produce a copy resized by `scale`.
    ///
    /// Uses bilinear filtering. Returns a plain clone if the scaled
    /// dimensions match the original.
    pub fn scaled(&self, scale: f64) -> RgbaImage {
        let (orig_w, orig_h) = (self.width(), self.height());
        let (new_w, new_h) = self.scaled_dimensions(scale);

        if (new_w, new_h) == (orig_w, orig_h) {
            return self.buffer.clone();
        }

        debug!(
            index = self.index,
            orig_w, orig_h, new_w, new_h, scale, "Scaling image for overlap search"
        );

        imageops::resize(&self.buffer, new_w, new_h, FilterType::Triangle)
    }
}

/// Round `width * scale` and `height * scale` to whole pixels, never below 1.
pub fn scaled_dimensions(width: u32, height: u32, scale: f64) -> (u32, u32) {
    let w = (f64::from(width) * scale).round().max(1.0) as u32;
    let h = (f64::from(height) * scale).round().max(1.0) as u32;
    (w, h)
}
