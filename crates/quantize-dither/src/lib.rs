#![allow(clippy::needless_range_loop, clippy::module_inception)]

//! quantize-dither: palette reduction with Floyd-Steinberg error diffusion
//!
//! This library reduces an RGBA8 image to a small palette. It builds a
//! representative palette from the image's own colors and maps every pixel
//! onto it, diffusing the quantization error to unprocessed neighbors.
//!
//! # Quick Start
//!
//! ```
//! use quantize_dither::{MedianCut, PaletteBuilder, Quantizer};
//!
//! let rgba: Vec<u8> = (0..16u8).flat_map(|v| [v * 16, 255 - v * 16, 64, 255]).collect();
//!
//! let palette = MedianCut.build(&rgba, 4).unwrap();
//! let result = Quantizer::new().quantize_rgba(&rgba, 4, 4, &palette).unwrap();
//!
//! assert!(result.distinct_colors() <= 4);
//! ```
//!
//! # Alpha
//!
//! Alpha never takes part in palette construction, matching or diffusion.
//! Callers that need transparency keep the alpha plane and reattach it with
//! [`QuantizedImage::to_rgba`].
//!
//! # Color Space
//!
//! Pixels are handled as [`Srgb`] floats. Palette matching uses squared
//! Euclidean RGB distance and error accumulates in the same space, so the
//! result agrees with what a plain nearest-color lookup would consider
//! closest.

pub mod api;
pub mod color;
pub mod dither;
pub mod output;
pub mod palette;


pub use api::{QuantizeError, Quantizer};
pub use color::Srgb;
pub use dither::{Dither, DitherOptions, FloydSteinberg};
pub use output::QuantizedImage;
pub use palette::{MedianCut, Palette, PaletteBuilder, PaletteError, ParseColorError};
