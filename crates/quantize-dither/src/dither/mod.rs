//! Error diffusion dithering.
//!
//! All algorithms implement the [`Dither`] trait. Configuration is done via
//! [`DitherOptions`]. Error is accumulated and diffused in sRGB space and
//! palette matching uses Euclidean RGB distance, so a pixel's nearest entry
//! is the same one a plain nearest-color quantizer would pick.
//!
//! # Example
//!
//! ```
//! use quantize_dither::{Dither, DitherOptions, FloydSteinberg, Palette, Srgb};
//!
//! let palette = Palette::from_hex(&["#000000", "#FFFFFF"]).unwrap();
//! let pixels = vec![Srgb::from_u8(128, 128, 128); 16];
//!
//! let indices = FloydSteinberg.dither(&pixels, 4, 4, &palette, &DitherOptions::new());
//! assert_eq!(indices.len(), 16);
//! ```

mod floyd_steinberg;
mod kernel;
mod options;

pub use floyd_steinberg::FloydSteinberg;
pub use kernel::{Kernel, FLOYD_STEINBERG};
pub use options::DitherOptions;

use crate::color::Srgb;
use crate::palette::Palette;

/// Trait for error diffusion dithering algorithms.
///
/// Error diffusion works by:
/// 1. For each pixel, find the nearest palette color
/// 2. Compute the quantization error (desired - actual)
/// 3. Distribute that error to neighboring unprocessed pixels
pub trait Dither: Send + Sync {
    /// Dither an image to palette indices.
    ///
    /// * `image` - Input pixels in row-major order, `width * height` long
    ///
    /// Returns one palette index per pixel, in row-major order. Each index
    /// is in the range `0..palette.len()`.
    fn dither(
        &self,
        image: &[Srgb],
        width: usize,
        height: usize,
        palette: &Palette,
        options: &DitherOptions,
    ) -> Vec<u8>;
}

/// Error buffer for efficient error diffusion.
///
/// Manages a sliding window of error rows, storing only the rows that
/// the diffusion kernel can reach (determined by `max_dy`). This avoids
/// allocating a full-image error buffer.
#[derive(Debug)]
pub struct ErrorBuffer {
    /// Error rows: rows[0] is current row, rows[1] is next, etc.
    rows: Vec<Vec<[f32; 3]>>,
    width: usize,
}

impl ErrorBuffer {
    /// Create a new error buffer tracking `row_depth` rows of `width` pixels.
    pub fn new(width: usize, row_depth: usize) -> Self {
        Self {
            rows: (0..row_depth).map(|_| vec![[0.0; 3]; width]).collect(),
            width,
        }
    }

    /// Get accumulated error for a pixel in the current row.
    #[inline]
    pub fn get_accumulated(&self, x: usize) -> [f32; 3] {
        self.rows[0][x]
    }

    /// Add error to a future pixel.
    ///
    /// `row_offset` 0 is the current row. Silently ignores out-of-bounds
    /// coordinates.
    #[inline]
    pub fn add_error(&mut self, x: usize, row_offset: usize, error: [f32; 3]) {
        if x < self.width && row_offset < self.rows.len() {
            for c in 0..3 {
                self.rows[row_offset][x][c] += error[c];
            }
        }
    }

    /// Advance to the next row.
    ///
    /// Rotates the row buffer: the first row is discarded, subsequent rows
    /// shift forward, and a new zeroed row is added at the end.
    pub fn advance_row(&mut self) {
        // Rotate left: [0,1,2] -> [1,2,0]
        self.rows.rotate_left(1);
        if let Some(last) = self.rows.last_mut() {
            last.fill([0.0; 3]);
        }
    }
}

/// Clamp a channel value with error to `[-max_error, 1.0 + max_error]`.
#[inline]
pub(crate) fn clamp_channel(value: f32, max_error: f32) -> f32 {
    value.clamp(-max_error, 1.0 + max_error)
}

/// Core error diffusion loop parameterized by kernel.
pub(crate) fn dither_with_kernel(
    image: &[Srgb],
    width: usize,
    height: usize,
    palette: &Palette,
    kernel: &Kernel,
    options: &DitherOptions,
) -> Vec<u8> {
    debug_assert_eq!(image.len(), width * height);

    let mut output = vec![0u8; width * height];
    let mut error_buf = ErrorBuffer::new(width, kernel.max_dy + 1);
    let divisor = kernel.divisor as f32;

    for y in 0..height {
        let reverse = options.serpentine && y % 2 == 1;

        let x_range: Box<dyn Iterator<Item = usize>> = if reverse {
            Box::new((0..width).rev())
        } else {
            Box::new(0..width)
        };

        for x in x_range {
            let idx = y * width + x;

            let accumulated = error_buf.get_accumulated(x);
            let pixel = Srgb::new(
                clamp_channel(image[idx].r + accumulated[0], options.error_clamp),
                clamp_channel(image[idx].g + accumulated[1], options.error_clamp),
                clamp_channel(image[idx].b + accumulated[2], options.error_clamp),
            );

            let (nearest_idx, _dist) = palette.find_nearest(pixel);
            output[idx] = nearest_idx as u8;

            let nearest = palette.color(nearest_idx);
            let error = [pixel.r - nearest.r, pixel.g - nearest.g, pixel.b - nearest.b];

            for &(dx, dy, weight) in kernel.entries {
                // Flip dx for serpentine reverse rows
                let effective_dx = if reverse { -dx } else { dx };
                let nx = x as i32 + effective_dx;

                if nx >= 0 && (nx as usize) < width && y + (dy as usize) < height {
                    let w = weight as f32 / divisor;
                    error_buf.add_error(
                        nx as usize,
                        dy as usize,
                        [error[0] * w, error[1] * w, error[2] * w],
                    );
                }
            }
        }

        error_buf.advance_row();
    }

    output
}
