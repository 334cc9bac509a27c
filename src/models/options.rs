//! Per-run processing options.
//!
//! A [`ProcessingOptions`] value is supplied fresh on every pipeline call and
//! never mutated. The processing cache compares it field by field against
//! the previous run to decide whether work can be skipped.

use serde::{Deserialize, Serialize};

use crate::error::OptionsError;

/// Smallest palette the quantizer will build.
pub const MIN_COLORS: u8 = 2;
/// Largest palette the quantizer will build.
pub const MAX_COLORS: u8 = 32;

/// Clockwise rotation in quarter turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum Rotation {
    #[default]
    None,
    Quarter,
    Half,
    ThreeQuarter,
}

impl Rotation {
    /// Parse a rotation in degrees. Any multiple of 90 is accepted,
    /// including negative values and full turns, and normalized into
    /// `0..360`.
    pub fn from_degrees(degrees: i32) -> Result<Self, OptionsError> {
        if degrees % 90 != 0 {
            return Err(OptionsError::InvalidRotation(degrees));
        }
        Ok(match degrees.rem_euclid(360) {
            0 => Rotation::None,
            90 => Rotation::Quarter,
            180 => Rotation::Half,
            _ => Rotation::ThreeQuarter,
        })
    }

    pub fn degrees(self) -> i32 {
        match self {
            Rotation::None => 0,
            Rotation::Quarter => 90,
            Rotation::Half => 180,
            Rotation::ThreeQuarter => 270,
        }
    }

    /// True for 90 and 270, where width and height trade places.
    pub fn swaps_dimensions(self) -> bool {
        matches!(self, Rotation::Quarter | Rotation::ThreeQuarter)
    }
}

impl TryFrom<i32> for Rotation {
    type Error = OptionsError;

    fn try_from(degrees: i32) -> Result<Self, Self::Error> {
        Rotation::from_degrees(degrees)
    }
}

impl From<Rotation> for i32 {
    fn from(rotation: Rotation) -> Self {
        rotation.degrees()
    }
}

/// Options for one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProcessingOptions {
    /// Encoder quality, 0..=100
    pub quality: u8,
    /// Longest side handed to the compressor, in pixels
    pub max_width: u32,
    pub apply_dithering: bool,
    /// Requested palette size; see [`effective_color_count`](Self::effective_color_count)
    pub color_count: u8,
    pub apply_blur: bool,
    pub rotation: Rotation,
}

impl Default for ProcessingOptions {
    fn default() -> Self {
        Self {
            quality: 75,
            max_width: 1920,
            apply_dithering: false,
            color_count: 8,
            apply_blur: false,
            rotation: Rotation::None,
        }
    }
}

impl ProcessingOptions {
    /// The palette size actually used: `color_count` clamped into
    /// `MIN_COLORS..=MAX_COLORS`. Out-of-range requests are not an error.
    pub fn effective_color_count(&self) -> u8 {
        self.color_count.clamp(MIN_COLORS, MAX_COLORS)
    }

    pub fn validate(&self) -> Result<(), OptionsError> {
        if self.quality > 100 {
            return Err(OptionsError::QualityOutOfRange(self.quality));
        }
        if self.max_width == 0 {
            return Err(OptionsError::ZeroMaxWidth);
        }
        Ok(())
    }
}
