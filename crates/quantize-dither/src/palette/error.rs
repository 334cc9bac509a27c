//! Error types for palette operations
//!
//! This module provides error types for color parsing and palette
//! construction, both for explicit palettes and for palettes built from
//! image content.

use std::num::ParseIntError;

use thiserror::Error;

/// Error type for parsing hex color strings.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseColorError {
    /// Hex string has invalid length (must be 3 or 6 characters after stripping '#')
    #[error("invalid hex color length (expected 3 or 6 characters)")]
    InvalidLength,
    /// Invalid hexadecimal character encountered
    #[error("invalid hex character: {0}")]
    InvalidHex(#[from] ParseIntError),
}

/// Error type for palette construction.
///
/// Returned when a palette cannot be created, either because the explicit
/// color list is invalid or because the image handed to a
/// [`PaletteBuilder`](super::PaletteBuilder) has no pixels to sample.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PaletteError {
    /// No colors provided in palette (or no pixels to build one from)
    #[error("palette cannot be empty")]
    EmptyPalette,
    /// Duplicate color found at the specified index
    #[error("duplicate color found at index {index}")]
    DuplicateColor {
        /// Index where the duplicate was found
        index: usize,
    },
    /// More entries than an index byte can address
    #[error("palette has {count} colors (max {max})")]
    TooManyColors {
        /// Number of colors supplied
        count: usize,
        /// Maximum supported palette size
        max: usize,
    },
    /// RGBA buffer is not a whole number of pixels
    #[error("RGBA buffer length {len} is not a multiple of 4")]
    MisalignedBuffer {
        /// Length of the rejected buffer
        len: usize,
    },
    /// Invalid hex color string
    #[error("invalid color: {0}")]
    ParseColor(#[from] ParseColorError),
}
