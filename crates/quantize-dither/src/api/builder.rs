//! Quantizer builder, the primary entry point for the crate.
//!
//! [`Quantizer`] wraps palette construction and Floyd-Steinberg dithering
//! behind a small fluent configuration.

use crate::color::Srgb;
use crate::dither::{Dither, DitherOptions, FloydSteinberg};
use crate::output::QuantizedImage;
use crate::palette::{MedianCut, Palette, PaletteBuilder};

use super::error::QuantizeError;

/// High-level quantization builder.
///
/// - Configuration methods consume and return `self`
/// - [`quantize_rgba()`](Self::quantize_rgba) takes `&self`, so one quantizer
///   is reusable across many images
/// - The palette is passed per call so callers can cache and reuse it
///
/// # Example
///
/// ```
/// use quantize_dither::{Palette, Quantizer};
///
/// let palette = Palette::from_hex(&["#000000", "#FFFFFF"]).unwrap();
/// let quantizer = Quantizer::new().serpentine(false);
///
/// let rgba = vec![128u8, 128, 128, 255].repeat(4);
/// let result = quantizer.quantize_rgba(&rgba, 2, 2, &palette).unwrap();
///
/// assert_eq!(result.width(), 2);
/// assert_eq!(result.indices().len(), 4);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Quantizer {
    dither_opts: DitherOptions,
}

impl Quantizer {
    /// Create a quantizer with default dither options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set serpentine scanning mode.
    #[inline]
    pub fn serpentine(mut self, enabled: bool) -> Self {
        self.dither_opts = self.dither_opts.serpentine(enabled);
        self
    }

    /// Set error clamping threshold.
    #[inline]
    pub fn error_clamp(mut self, clamp: f32) -> Self {
        self.dither_opts = self.dither_opts.error_clamp(clamp);
        self
    }

    /// Current dither options.
    pub fn options(&self) -> &DitherOptions {
        &self.dither_opts
    }

    /// Map an RGBA8 buffer onto `palette` with Floyd-Steinberg diffusion.
    ///
    /// Alpha is ignored; only RGB participates in matching and diffusion.
    ///
    /// # Errors
    ///
    /// - [`QuantizeError::EmptyImage`] if either dimension is zero
    /// - [`QuantizeError::BufferSize`] if `rgba.len() != width * height * 4`
    pub fn quantize_rgba(
        &self,
        rgba: &[u8],
        width: usize,
        height: usize,
        palette: &Palette,
    ) -> Result<QuantizedImage, QuantizeError> {
        if width == 0 || height == 0 {
            return Err(QuantizeError::EmptyImage);
        }
        let expected = width
            .checked_mul(height)
            .and_then(|n| n.checked_mul(4))
            .ok_or(QuantizeError::BufferSize {
                expected: usize::MAX,
                actual: rgba.len(),
            })?;
        if rgba.len() != expected {
            return Err(QuantizeError::BufferSize {
                expected,
                actual: rgba.len(),
            });
        }

        let pixels: Vec<Srgb> = rgba
            .chunks_exact(4)
            .map(|px| Srgb::from_u8(px[0], px[1], px[2]))
            .collect();

        let indices = FloydSteinberg.dither(&pixels, width, height, palette, &self.dither_opts);
        Ok(QuantizedImage::new(indices, width, height, palette.clone()))
    }

    /// Build a [`MedianCut`] palette of at most `max_colors` entries from
    /// `rgba` and quantize against it in one step.
    pub fn quantize_adaptive(
        &self,
        rgba: &[u8],
        width: usize,
        height: usize,
        max_colors: usize,
    ) -> Result<QuantizedImage, QuantizeError> {
        if width == 0 || height == 0 {
            return Err(QuantizeError::EmptyImage);
        }
        let palette = MedianCut.build(rgba, max_colors)?;
        self.quantize_rgba(rgba, width, height, &palette)
    }
}
