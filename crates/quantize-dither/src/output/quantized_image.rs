//! QuantizedImage struct with indexed and expanded output forms.

use crate::palette::Palette;

/// The canonical output of the quantization pipeline.
///
/// Stores one `u8` palette index per pixel in row-major order, along with
/// image dimensions and the palette the indices refer to.
///
/// # Example
///
/// ```
/// use quantize_dither::{Palette, QuantizedImage};
///
/// let palette = Palette::from_hex(&["#000000", "#FFFFFF"]).unwrap();
/// let image = QuantizedImage::new(vec![0, 1, 1, 0], 2, 2, palette);
///
/// assert_eq!(image.to_rgb().len(), 2 * 2 * 3);
/// assert_eq!(image.to_rgba(&[255, 255, 0, 0])[3], 255);
/// ```
#[derive(Debug, Clone)]
pub struct QuantizedImage {
    indices: Vec<u8>,
    width: usize,
    height: usize,
    palette: Palette,
}

impl QuantizedImage {
    /// Create a new `QuantizedImage` from palette indices.
    ///
    /// # Panics (debug only)
    ///
    /// Debug-asserts that `indices.len() == width * height`.
    pub fn new(indices: Vec<u8>, width: usize, height: usize, palette: Palette) -> Self {
        debug_assert_eq!(
            indices.len(),
            width * height,
            "indices length ({}) must match width * height ({}x{}={})",
            indices.len(),
            width,
            height,
            width * height,
        );
        Self {
            indices,
            width,
            height,
            palette,
        }
    }

    /// Returns the palette indices as a slice.
    #[inline]
    pub fn indices(&self) -> &[u8] {
        &self.indices
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    /// Expand to `[R, G, B, ...]` bytes.
    pub fn to_rgb(&self) -> Vec<u8> {
        let mut rgb = Vec::with_capacity(self.indices.len() * 3);
        for &idx in &self.indices {
            rgb.extend_from_slice(&self.palette.bytes(idx as usize));
        }
        rgb
    }

    /// Expand to `[R, G, B, A, ...]` bytes, taking alpha from `alpha`.
    ///
    /// `alpha` holds one byte per pixel. Missing entries are treated as
    /// fully opaque.
    pub fn to_rgba(&self, alpha: &[u8]) -> Vec<u8> {
        let mut rgba = Vec::with_capacity(self.indices.len() * 4);
        for (i, &idx) in self.indices.iter().enumerate() {
            rgba.extend_from_slice(&self.palette.bytes(idx as usize));
            rgba.push(alpha.get(i).copied().unwrap_or(u8::MAX));
        }
        rgba
    }

    /// Number of distinct palette entries actually used.
    pub fn distinct_colors(&self) -> usize {
        let mut used = [false; 256];
        for &idx in &self.indices {
            used[idx as usize] = true;
        }
        used.iter().filter(|&&u| u).count()
    }
}
