//! Mock collaborators.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use darkroom::models::Bitmap;
use darkroom::services::{
    CompressionError, CompressionRequest, Compressor, Detection, DetectionError, FaceDetector,
};
use quantize_dither::{MedianCut, Palette, PaletteBuilder, PaletteError};

/// Median-cut builder that counts how often it is asked for a palette
#[derive(Debug, Default)]
pub struct CountingBuilder {
    calls: AtomicUsize,
}

impl CountingBuilder {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl PaletteBuilder for CountingBuilder {
    fn build(&self, rgba: &[u8], max_colors: usize) -> Result<Palette, PaletteError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        MedianCut.build(rgba, max_colors)
    }
}

/// Builder that always fails
pub struct FailingBuilder;

impl PaletteBuilder for FailingBuilder {
    fn build(&self, _rgba: &[u8], _max_colors: usize) -> Result<Palette, PaletteError> {
        Err(PaletteError::EmptyPalette)
    }
}

/// Detector that always returns the same boxes
pub struct FixedDetector(pub Vec<Detection>);

#[async_trait]
impl FaceDetector for FixedDetector {
    async fn detect(
        &self,
        _bitmap: &Bitmap,
        _min_confidence: f32,
    ) -> Result<Vec<Detection>, DetectionError> {
        Ok(self.0.clone())
    }
}

/// Detector whose model never loads
pub struct FailingDetector;

#[async_trait]
impl FaceDetector for FailingDetector {
    async fn detect(
        &self,
        _bitmap: &Bitmap,
        _min_confidence: f32,
    ) -> Result<Vec<Detection>, DetectionError> {
        Err(DetectionError::ModelUnavailable("weights missing".to_string()))
    }
}

/// Detector that hangs far longer than any test timeout
pub struct StalledDetector;

#[async_trait]
impl FaceDetector for StalledDetector {
    async fn detect(
        &self,
        _bitmap: &Bitmap,
        _min_confidence: f32,
    ) -> Result<Vec<Detection>, DetectionError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(vec![Detection::new(0.0, 0.0, 10.0, 10.0)])
    }
}

/// Compressor that returns its input untouched
pub struct PassthroughCompressor;

#[async_trait]
impl Compressor for PassthroughCompressor {
    async fn compress(
        &self,
        bytes: Arc<[u8]>,
        _request: CompressionRequest,
    ) -> Result<Vec<u8>, CompressionError> {
        Ok(bytes.to_vec())
    }
}

/// Compressor that always fails
pub struct FailingCompressor;

#[async_trait]
impl Compressor for FailingCompressor {
    async fn compress(
        &self,
        _bytes: Arc<[u8]>,
        _request: CompressionRequest,
    ) -> Result<Vec<u8>, CompressionError> {
        Err(CompressionError::Encode("worker crashed".to_string()))
    }
}

/// Compressor that never finishes
pub struct StalledCompressor;

#[async_trait]
impl Compressor for StalledCompressor {
    async fn compress(
        &self,
        bytes: Arc<[u8]>,
        _request: CompressionRequest,
    ) -> Result<Vec<u8>, CompressionError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(bytes.to_vec())
    }
}
