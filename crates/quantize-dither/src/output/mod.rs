//! Output types for the quantization pipeline.
//!
//! [`QuantizedImage`] stores palette indices with dimension metadata and an
//! owned [`Palette`](crate::palette::Palette). The indexed form is canonical;
//! RGB and RGBA buffers are produced on demand.

mod quantized_image;

pub use quantized_image::QuantizedImage;
