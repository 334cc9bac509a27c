//! Color type and conversion utilities
//!
//! Quantization works directly on gamma-encoded sRGB values. Palette
//! matching uses plain Euclidean distance in RGB space, and quantization
//! error is diffused in the same space.
//!
//! # Example
//!
//! ```
//! use quantize_dither::Srgb;
//!
//! // Load a pixel from an RGBA buffer
//! let pixel = Srgb::from_u8(128, 64, 32);
//!
//! // ... do arithmetic in 0.0..=1.0 floats ...
//!
//! // Convert back to bytes for output
//! assert_eq!(pixel.to_bytes(), [128, 64, 32]);
//! ```

mod srgb;

pub use srgb::Srgb;
