use thiserror::Error;

use crate::services::collaborators::CompressionError;

/// Top-level failure of a single `process()` or `crop()` call.
///
/// Stages with a degrade path (face blur, quantization) never produce one of
/// these; they log and hand the bitmap through unchanged.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Invalid options: {0}")]
    InvalidOptions(#[from] OptionsError),

    #[error("Compression failed: {0}")]
    Compression(#[from] CompressionError),

    #[error("Compression timed out after {secs}s")]
    CompressionTimeout { secs: u64 },

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Image has no pixels")]
    EmptyBitmap,

    #[error("Encode error: {0}")]
    Encode(#[from] EncodeError),

    #[error("Invalid crop: {0}")]
    InvalidCrop(String),

    #[error("No source image loaded")]
    NoSource,
}

impl From<BitmapError> for PipelineError {
    fn from(e: BitmapError) -> Self {
        PipelineError::Decode(e.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BitmapError {
    #[error("Buffer size mismatch: expected {expected} bytes, got {actual}")]
    BufferSize { expected: usize, actual: usize },

    #[error("Unsupported dimensions: {width}x{height}")]
    UnsupportedDimensions { width: u32, height: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OptionsError {
    #[error("Rotation must be a multiple of 90 degrees, got {0}")]
    InvalidRotation(i32),

    #[error("Quality must be between 0 and 100, got {0}")]
    QualityOutOfRange(u8),

    #[error("Max width must be at least 1 pixel")]
    ZeroMaxWidth,
}

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("JPEG encode error: {0}")]
    Jpeg(String),

    #[error("PNG encode error: {0}")]
    Png(String),

    #[error("Cannot encode an empty bitmap")]
    EmptyBitmap,
}
