//! Palette types and utilities
//!
//! This module provides the [`Palette`] type, the [`PaletteBuilder`] trait
//! for deriving a palette from image content, and the default
//! [`MedianCut`] builder.

mod error;
mod median_cut;
mod palette;

pub use error::{PaletteError, ParseColorError};
pub use median_cut::{MedianCut, PaletteBuilder};
pub use palette::{Palette, MAX_PALETTE_SIZE};
