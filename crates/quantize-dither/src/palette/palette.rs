//! Palette struct with nearest-color matching.
//!
//! A [`Palette`] is an ordered, duplicate-free list of sRGB colors. It is
//! immutable after construction, so a palette built once for an image can
//! be shared and reused for every later quantization of the same content.

use std::collections::HashSet;
use std::str::FromStr;

use super::error::PaletteError;
use crate::color::Srgb;

/// Largest palette a `u8` index can address.
pub const MAX_PALETTE_SIZE: usize = 256;

/// An ordered set of representative colors.
///
/// # Precomputation
///
/// The byte form of every entry is computed once at construction so output
/// conversion never has to round floats per pixel.
///
/// # Example
///
/// ```
/// use quantize_dither::{Palette, Srgb};
///
/// let colors = [Srgb::from_u8(0, 0, 0), Srgb::from_u8(255, 255, 255)];
/// let palette = Palette::new(&colors).unwrap();
///
/// assert_eq!(palette.len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Palette {
    colors: Vec<Srgb>,
    bytes: Vec<[u8; 3]>,
}

impl Palette {
    /// Create a new palette from sRGB colors.
    ///
    /// # Errors
    ///
    /// - [`PaletteError::EmptyPalette`] if `colors` is empty
    /// - [`PaletteError::TooManyColors`] if there are more than 256 entries
    /// - [`PaletteError::DuplicateColor`] if two entries have the same bytes
    pub fn new(colors: &[Srgb]) -> Result<Self, PaletteError> {
        if colors.is_empty() {
            return Err(PaletteError::EmptyPalette);
        }
        if colors.len() > MAX_PALETTE_SIZE {
            return Err(PaletteError::TooManyColors {
                count: colors.len(),
                max: MAX_PALETTE_SIZE,
            });
        }

        let mut seen = HashSet::new();
        let mut bytes = Vec::with_capacity(colors.len());
        for (i, color) in colors.iter().enumerate() {
            let b = color.to_bytes();
            if !seen.insert(b) {
                return Err(PaletteError::DuplicateColor { index: i });
            }
            bytes.push(b);
        }

        // Snap stored colors to their byte values so the diffused error is
        // measured against exactly what ends up in the output buffer.
        let colors = bytes.iter().map(|&b| Srgb::from_bytes(b)).collect();

        Ok(Self { colors, bytes })
    }

    /// Create a palette from hex color strings like `"#FF0000"` or `"#F00"`.
    ///
    /// # Example
    ///
    /// ```
    /// use quantize_dither::Palette;
    ///
    /// let palette = Palette::from_hex(&["#000000", "#FFFFFF", "#FF0000"]).unwrap();
    /// assert_eq!(palette.len(), 3);
    /// ```
    pub fn from_hex(colors: &[&str]) -> Result<Self, PaletteError> {
        let parsed = colors
            .iter()
            .map(|s| Srgb::from_str(s).map_err(PaletteError::ParseColor))
            .collect::<Result<Vec<_>, _>>()?;
        Palette::new(&parsed)
    }

    /// Returns the number of colors in the palette.
    #[inline]
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// Always `false`: empty palettes are rejected at construction.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Get the color at the given index.
    #[inline]
    pub fn color(&self, idx: usize) -> Srgb {
        self.colors[idx]
    }

    /// Get the color at the given index as `[R, G, B]` bytes.
    #[inline]
    pub fn bytes(&self, idx: usize) -> [u8; 3] {
        self.bytes[idx]
    }

    /// All palette colors in order.
    #[inline]
    pub fn colors(&self) -> &[Srgb] {
        &self.colors
    }

    /// Find the nearest palette color using Euclidean RGB distance.
    ///
    /// Returns `(index, squared_distance)`. Ties go to the lowest index.
    ///
    /// # Example
    ///
    /// ```
    /// use quantize_dither::{Palette, Srgb};
    ///
    /// let palette = Palette::from_hex(&["#000000", "#FFFFFF"]).unwrap();
    /// let (idx, _) = palette.find_nearest(Srgb::from_u8(200, 200, 200));
    /// assert_eq!(idx, 1);
    /// ```
    #[inline]
    pub fn find_nearest(&self, color: Srgb) -> (usize, f32) {
        // Linear scan; palettes here hold at most a few dozen entries
        let mut best_idx = 0;
        let mut best_dist = f32::MAX;

        for (i, &entry) in self.colors.iter().enumerate() {
            let dist = color.distance_sq(entry);
            if dist < best_dist {
                best_dist = dist;
                best_idx = i;
            }
        }

        (best_idx, best_dist)
    }
}
