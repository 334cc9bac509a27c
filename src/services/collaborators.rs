//! External collaborators the pipeline depends on.
//!
//! Compression, face detection and metadata extraction sit behind async
//! traits so callers can plug in their own implementations (or test
//! doubles). Each trait ships with a default implementation.

use std::io::Cursor;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ExtendedColorType, ImageFormat};
use serde::Serialize;
use thiserror::Error;

use crate::models::Bitmap;
use crate::services::camera;

#[derive(Debug, Error)]
pub enum CompressionError {
    #[error("Failed to decode source: {0}")]
    Decode(String),

    #[error("Failed to encode output: {0}")]
    Encode(String),

    #[error("Compression task failed: {0}")]
    Task(String),
}

#[derive(Debug, Error)]
pub enum DetectionError {
    #[error("Detection model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("Detection failed: {0}")]
    Failed(String),
}

#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("Failed to parse metadata: {0}")]
    Parse(String),
}

/// What the compressor is asked to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressionRequest {
    /// Starting encoder quality, 0..=100
    pub quality: u8,
    /// Longest side of the output, in pixels
    pub max_dimension: u32,
    /// Size the output should get under, in bytes
    pub target_size_bytes: usize,
    /// Quality is never lowered below this to meet the size target
    pub min_quality: u8,
}

/// Re-encodes and downsizes a source file.
#[async_trait]
pub trait Compressor: Send + Sync {
    /// Returns the re-encoded bytes. May go below `request.quality` to reach
    /// the size target, and must keep the image's orientation.
    async fn compress(
        &self,
        bytes: Arc<[u8]>,
        request: CompressionRequest,
    ) -> Result<Vec<u8>, CompressionError>;
}

/// Default compressor built on the `image` crate.
///
/// PNG input stays PNG (and keeps its alpha); anything else becomes JPEG.
/// The image is only ever scaled down.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageCompressor;

#[async_trait]
impl Compressor for ImageCompressor {
    async fn compress(
        &self,
        bytes: Arc<[u8]>,
        request: CompressionRequest,
    ) -> Result<Vec<u8>, CompressionError> {
        tokio::task::spawn_blocking(move || compress_blocking(&bytes, request))
            .await
            .map_err(|e| CompressionError::Task(e.to_string()))?
    }
}

fn compress_blocking(bytes: &[u8], request: CompressionRequest) -> Result<Vec<u8>, CompressionError> {
    let format = image::guess_format(bytes).ok();
    let decoded =
        camera::decode_upright(bytes).map_err(|e| CompressionError::Decode(e.to_string()))?;

    let (width, height) = (decoded.width(), decoded.height());
    let max_dim = request.max_dimension.max(1);
    let resized = if width.max(height) > max_dim {
        // resize() keeps the aspect ratio and fits inside the box
        decoded.resize(max_dim, max_dim, FilterType::CatmullRom)
    } else {
        decoded
    };

    if format == Some(ImageFormat::Png) {
        let mut out = Vec::new();
        resized
            .write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
            .map_err(|e| CompressionError::Encode(e.to_string()))?;
        tracing::debug!(
            width = resized.width(),
            height = resized.height(),
            size = out.len(),
            "Compressed PNG source"
        );
        return Ok(out);
    }

    let rgb = DynamicImage::ImageRgb8(resized.to_rgb8());
    let min_quality = request.min_quality.clamp(1, 100);
    let mut quality = request.quality.clamp(1, 100);
    loop {
        let out = encode_jpeg(&rgb, quality)?;
        if out.len() <= request.target_size_bytes || quality <= min_quality {
            tracing::debug!(
                width = rgb.width(),
                height = rgb.height(),
                quality,
                size = out.len(),
                "Compressed JPEG source"
            );
            return Ok(out);
        }
        quality = quality.saturating_sub(10).max(min_quality);
    }
}

fn encode_jpeg(image: &DynamicImage, quality: u8) -> Result<Vec<u8>, CompressionError> {
    let rgb = image.to_rgb8();
    let mut out = Vec::new();
    JpegEncoder::new_with_quality(Cursor::new(&mut out), quality)
        .encode(rgb.as_raw(), rgb.width(), rgb.height(), ExtendedColorType::Rgb8)
        .map_err(|e| CompressionError::Encode(e.to_string()))?;
    Ok(out)
}

/// A face bounding box in bitmap pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Detection {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Detector confidence, 0.0..=1.0
    pub score: f32,
}

impl Detection {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            score: 1.0,
        }
    }
}

/// Finds faces in a bitmap.
///
/// "No faces" is an empty list, never an error. The first call may be slow
/// while a model loads.
#[async_trait]
pub trait FaceDetector: Send + Sync {
    async fn detect(
        &self,
        bitmap: &Bitmap,
        min_confidence: f32,
    ) -> Result<Vec<Detection>, DetectionError>;
}

/// Detector that never finds anything. Used when no model is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFaceDetector;

#[async_trait]
impl FaceDetector for NoFaceDetector {
    async fn detect(
        &self,
        _bitmap: &Bitmap,
        _min_confidence: f32,
    ) -> Result<Vec<Detection>, DetectionError> {
        Ok(Vec::new())
    }
}

/// Camera metadata shown next to the image. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImageMetadata {
    pub camera_make: Option<String>,
    pub camera_model: Option<String>,
    pub timestamp: Option<NaiveDateTime>,
    /// Exposure time in seconds
    pub exposure_time: Option<f64>,
    /// F-number
    pub aperture: Option<f64>,
    pub iso: Option<u32>,
    /// Focal length in millimetres
    pub focal_length: Option<f64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl ImageMetadata {
    /// True when at least one field is present.
    pub fn has_metadata(&self) -> bool {
        self.camera_make.is_some()
            || self.camera_model.is_some()
            || self.timestamp.is_some()
            || self.exposure_time.is_some()
            || self.aperture.is_some()
            || self.iso.is_some()
            || self.focal_length.is_some()
            || self.latitude.is_some()
            || self.longitude.is_some()
    }

    /// Exposure formatted the way cameras show it, e.g. `"1/250s"` or `"2s"`.
    pub fn exposure_display(&self) -> Option<String> {
        let t = self.exposure_time?;
        if t <= 0.0 {
            return None;
        }
        if t < 1.0 {
            Some(format!("1/{}s", (1.0 / t).round() as u64))
        } else {
            Some(format!("{}s", (t * 10.0).round() / 10.0))
        }
    }
}

/// Parses camera metadata from an encoded file.
#[async_trait]
pub trait MetadataExtractor: Send + Sync {
    async fn extract(&self, bytes: &[u8]) -> Result<ImageMetadata, MetadataError>;
}

/// Extractor that reports no metadata.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMetadata;

#[async_trait]
impl MetadataExtractor for NoMetadata {
    async fn extract(&self, _bytes: &[u8]) -> Result<ImageMetadata, MetadataError> {
        Ok(ImageMetadata::default())
    }
}
