//! Unified error type for the quantize-dither public API.

use thiserror::Error;

use crate::palette::PaletteError;

/// Unified error type for the quantize-dither public API.
///
/// # Example
///
/// ```
/// use quantize_dither::{Palette, QuantizeError};
///
/// fn create_palette() -> Result<Palette, QuantizeError> {
///     let palette = Palette::from_hex(&["#000000", "#FFFFFF"])?;
///     Ok(palette)
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QuantizeError {
    /// Palette could not be built or validated
    #[error("palette error: {0}")]
    Palette(#[from] PaletteError),
    /// Pixel buffer does not match the stated dimensions
    #[error("buffer size mismatch: expected {expected} bytes, got {actual}")]
    BufferSize {
        /// `width * height * 4`
        expected: usize,
        /// Length of the buffer that was passed in
        actual: usize,
    },
    /// Width or height is zero
    #[error("image has no pixels")]
    EmptyImage,
}
