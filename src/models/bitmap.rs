use std::collections::HashSet;

use image::RgbaImage;

use crate::error::BitmapError;

/// The RGBA working surface every stage operates on.
///
/// Wraps an [`image::RgbaImage`], so the buffer length is always
/// `width * height * 4`. Stages take a `Bitmap` by value and hand back the
/// next one; nothing aliases it between stages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    image: RgbaImage,
}

impl Bitmap {
    /// A fully transparent black bitmap.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::new(width, height),
        }
    }

    /// Wrap a raw RGBA buffer, checking its length against the dimensions.
    pub fn from_raw(width: u32, height: u32, buf: Vec<u8>) -> Result<Self, BitmapError> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(4))
            .ok_or(BitmapError::UnsupportedDimensions { width, height })?;
        if buf.len() != expected {
            return Err(BitmapError::BufferSize {
                expected,
                actual: buf.len(),
            });
        }
        let actual = buf.len();
        RgbaImage::from_raw(width, height, buf)
            .map(|image| Self { image })
            .ok_or(BitmapError::BufferSize { expected, actual })
    }

    pub fn from_rgba_image(image: RgbaImage) -> Self {
        Self { image }
    }

    pub fn into_rgba_image(self) -> RgbaImage {
        self.image
    }

    pub fn as_rgba_image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn as_rgba_image_mut(&mut self) -> &mut RgbaImage {
        &mut self.image
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Raw `[R, G, B, A, ...]` bytes in row-major order.
    #[inline]
    pub fn as_raw(&self) -> &[u8] {
        self.image.as_raw()
    }

    /// RGBA of the pixel at `(x, y)`. Panics when out of bounds.
    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        self.image.get_pixel(x, y).0
    }

    /// True when either dimension is zero.
    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    /// One alpha byte per pixel.
    pub fn alpha_channel(&self) -> Vec<u8> {
        self.as_raw().chunks_exact(4).map(|px| px[3]).collect()
    }

    /// Number of distinct RGB triples, ignoring alpha.
    pub fn distinct_rgb_colors(&self) -> usize {
        self.as_raw()
            .chunks_exact(4)
            .map(|px| [px[0], px[1], px[2]])
            .collect::<HashSet<_>>()
            .len()
    }
}
