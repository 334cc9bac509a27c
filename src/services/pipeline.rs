//! Pipeline orchestrator.
//!
//! Runs compression, decode, the planned stages and the final encode in a
//! fixed order, consulting and updating the [`ProcessingCache`] the caller
//! owns. The cache is only written after a run fully succeeds.

use std::sync::Arc;
use std::time::Instant;

use image::{imageops, ImageFormat};
use quantize_dither::{MedianCut, PaletteBuilder, Quantizer};

use crate::error::PipelineError;
use crate::models::{
    Bitmap, CropRect, OutputFormat, PipelineConfig, ProcessedImage, ProcessingOptions,
    SourceImage,
};
use crate::services::cache::{content_hash, PaletteStore, ProcessingCache, Snapshot};
use crate::services::camera::ExifMetadata;
use crate::services::collaborators::{
    CompressionRequest, Compressor, Detection, FaceDetector, ImageCompressor, ImageMetadata,
    MetadataError, MetadataExtractor, NoFaceDetector,
};
use crate::services::progress::{steps, ProgressReporter};
use crate::stages::{self, BlurSettings, QuantizeOutcome, Stage};

/// Sequences the processing stages and their external collaborators.
pub struct Pipeline {
    config: Arc<PipelineConfig>,
    compressor: Arc<dyn Compressor>,
    detector: Arc<dyn FaceDetector>,
    metadata: Arc<dyn MetadataExtractor>,
    palette_builder: Arc<dyn PaletteBuilder>,
    quantizer: Quantizer,
}

impl Pipeline {
    /// Pipeline with the default collaborators: [`ImageCompressor`],
    /// [`NoFaceDetector`], [`ExifMetadata`] and a [`MedianCut`] palette builder.
    pub fn new(config: PipelineConfig) -> Self {
        let quantizer = Quantizer::new()
            .serpentine(config.serpentine)
            .error_clamp(config.error_clamp);

        Self {
            config: Arc::new(config),
            compressor: Arc::new(ImageCompressor),
            detector: Arc::new(NoFaceDetector),
            metadata: Arc::new(ExifMetadata),
            palette_builder: Arc::new(MedianCut),
            quantizer,
        }
    }

    pub fn with_compressor(mut self, compressor: Arc<dyn Compressor>) -> Self {
        self.compressor = compressor;
        self
    }

    pub fn with_detector(mut self, detector: Arc<dyn FaceDetector>) -> Self {
        self.detector = detector;
        self
    }

    pub fn with_metadata_extractor(mut self, metadata: Arc<dyn MetadataExtractor>) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_palette_builder(mut self, builder: Arc<dyn PaletteBuilder>) -> Self {
        self.palette_builder = builder;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// A fresh cache sized from this pipeline's configuration.
    pub fn new_cache(&self) -> ProcessingCache {
        ProcessingCache::new(self.config.palette_cache_capacity)
    }

    /// Process `source` with `options`.
    ///
    /// On a cache hit the cached bitmap is re-encoded and nothing else runs.
    /// On a miss the full pipeline runs and, if it succeeds, the cache is
    /// updated with the pre-encode snapshot. A failed run leaves the cached
    /// options and snapshot untouched.
    ///
    /// Quantization or face detection failing does not fail the run; the
    /// stage is skipped and the reason lands in
    /// [`ProcessedImage::warnings`].
    pub async fn process(
        &self,
        cache: &mut ProcessingCache,
        source: &SourceImage,
        options: &ProcessingOptions,
        progress: &dyn ProgressReporter,
    ) -> Result<ProcessedImage, PipelineError> {
        options.validate()?;
        let start = Instant::now();

        if !cache.should_reprocess(options, source) {
            if let Some(snapshot) = cache.snapshot() {
                let bitmap = &snapshot.bitmap;
                let bytes = self.encode(bitmap, options.quality, progress)?;
                tracing::info!(
                    source = source.name(),
                    width = bitmap.width(),
                    height = bitmap.height(),
                    size = bytes.len(),
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Re-encoded cached bitmap"
                );
                return Ok(self.output(bytes, snapshot, true));
            }
        }

        progress.report(steps::COMPRESS, 0);
        let compressed = self.compress(source, options).await?;
        progress.report(steps::COMPRESS, 100);

        progress.report(steps::DECODE, 0);
        let mut snapshot = Snapshot::from(stages::decode(&compressed)?);
        progress.report(steps::DECODE, 100);

        let plan = Stage::plan(options);
        for stage in &plan {
            snapshot = self
                .run_stage(*stage, snapshot, cache.palettes_mut(), progress)
                .await;
        }

        let bytes = self.encode(&snapshot.bitmap, options.quality, progress)?;
        let output = self.output(bytes, &snapshot, false);

        tracing::info!(
            source = source.name(),
            stages = plan.len(),
            skipped = output.warnings.len(),
            width = output.width,
            height = output.height,
            size = output.size_bytes,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Processed image"
        );

        cache.update(options.clone(), source.id(), snapshot);
        Ok(output)
    }

    fn output(&self, bytes: Vec<u8>, snapshot: &Snapshot, from_cache: bool) -> ProcessedImage {
        ProcessedImage {
            palette: snapshot.palette.clone(),
            warnings: snapshot.warnings.clone(),
            ..ProcessedImage::new(
                bytes,
                snapshot.bitmap.width(),
                snapshot.bitmap.height(),
                self.config.output_format,
                from_cache,
            )
        }
    }

    /// Crop `source` to `rect` and return it as a new source image.
    ///
    /// PNG sources stay PNG; anything else is re-encoded as JPEG at
    /// `quality`. The result has a new identity, so feeding it to
    /// [`process`](Self::process) always misses the cache.
    pub fn crop(
        &self,
        source: &SourceImage,
        rect: CropRect,
        quality: u8,
    ) -> Result<SourceImage, PipelineError> {
        rect.validate()?;
        let bitmap = stages::decode(source.bytes())?;
        let (x, y, width, height) = rect.to_pixels(bitmap.width(), bitmap.height());
        let cropped = Bitmap::from_rgba_image(
            imageops::crop_imm(bitmap.as_rgba_image(), x, y, width, height).to_image(),
        );

        let format = match image::guess_format(source.bytes()) {
            Ok(ImageFormat::Png) => OutputFormat::Png,
            _ => OutputFormat::Jpeg,
        };
        let bytes = stages::encode(&cropped, format, quality, false)?;

        tracing::debug!(
            source = source.name(),
            x,
            y,
            width,
            height,
            "Cropped source image"
        );
        Ok(SourceImage::new(cropped_name(source.name(), format), bytes))
    }

    /// Camera metadata of `source`, for display only.
    pub async fn metadata(&self, source: &SourceImage) -> Result<ImageMetadata, MetadataError> {
        self.metadata.extract(source.bytes()).await
    }

    async fn compress(
        &self,
        source: &SourceImage,
        options: &ProcessingOptions,
    ) -> Result<Vec<u8>, PipelineError> {
        let request = CompressionRequest {
            quality: options.quality,
            max_dimension: options.max_width,
            target_size_bytes: self.config.target_size_bytes,
            min_quality: self.config.min_quality,
        };
        let compress = self.compressor.compress(source.shared_bytes(), request);

        let compressed = match self.config.compression_timeout() {
            Some(limit) => tokio::time::timeout(limit, compress)
                .await
                .map_err(|_| PipelineError::CompressionTimeout {
                    secs: self.config.compression_timeout_secs,
                })??,
            None => compress.await?,
        };

        tracing::debug!(
            original = source.size_bytes(),
            compressed = compressed.len(),
            "Compression finished"
        );
        Ok(compressed)
    }

    async fn run_stage(
        &self,
        stage: Stage,
        mut snapshot: Snapshot,
        palettes: &mut PaletteStore,
        progress: &dyn ProgressReporter,
    ) -> Snapshot {
        // Detection is its own progress step and finishes before blurring starts
        let detections = match stage {
            Stage::Blur => {
                progress.report(steps::DETECT_FACES, 0);
                let found = match self.detect_faces(&snapshot.bitmap).await {
                    Ok(found) => found,
                    Err(reason) => {
                        snapshot.warnings.push(reason);
                        Vec::new()
                    }
                };
                progress.report(steps::DETECT_FACES, 100);
                found
            }
            _ => Vec::new(),
        };

        progress.report(stage.label(), 0);
        snapshot.bitmap = match stage {
            Stage::Rotate(rotation) => stages::rotate(snapshot.bitmap, rotation),
            Stage::Quantize { color_count } => {
                let hash = content_hash(&snapshot.bitmap);
                let outcome = stages::quantize(
                    snapshot.bitmap,
                    color_count,
                    palettes,
                    &hash,
                    self.palette_builder.as_ref(),
                    &self.quantizer,
                    progress,
                );
                snapshot.palette = outcome.palette_colors();
                match outcome {
                    QuantizeOutcome::Quantized { bitmap, .. } => bitmap,
                    QuantizeOutcome::Failed { bitmap, reason } => {
                        tracing::warn!(color_count, %reason, "Continuing without quantization");
                        snapshot.warnings.push(format!("quantization skipped: {reason}"));
                        bitmap
                    }
                }
            }
            Stage::Blur => stages::blur(
                snapshot.bitmap,
                &detections,
                &BlurSettings::from(&*self.config),
            ),
        };
        progress.report(stage.label(), 100);
        snapshot
    }

    /// Faces in `bitmap`. `Err` carries why detection was skipped.
    async fn detect_faces(&self, bitmap: &Bitmap) -> Result<Vec<Detection>, String> {
        let detect = self
            .detector
            .detect(bitmap, self.config.detector_min_confidence);

        let result = match self.config.detector_timeout() {
            Some(limit) => match tokio::time::timeout(limit, detect).await {
                Ok(result) => result,
                Err(_) => {
                    tracing::warn!(
                        timeout_secs = self.config.detector_timeout_secs,
                        "Face detection timed out, skipping blur"
                    );
                    return Err(format!(
                        "face detection timed out after {}s",
                        self.config.detector_timeout_secs
                    ));
                }
            },
            None => detect.await,
        };

        match result {
            Ok(detections) => {
                tracing::debug!(faces = detections.len(), "Face detection finished");
                Ok(detections)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Face detection failed, skipping blur");
                Err(format!("face detection skipped: {e}"))
            }
        }
    }

    fn encode(
        &self,
        bitmap: &Bitmap,
        quality: u8,
        progress: &dyn ProgressReporter,
    ) -> Result<Vec<u8>, PipelineError> {
        progress.report(steps::ENCODE, 0);
        let bytes = stages::encode(
            bitmap,
            self.config.output_format,
            quality,
            self.config.optimize_png,
        )?;
        progress.report(steps::ENCODE, 100);
        Ok(bytes)
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(PipelineConfig::default())
    }
}

fn cropped_name(name: &str, format: OutputFormat) -> String {
    let stem = name.rsplit_once('.').map_or(name, |(stem, _)| stem);
    format!("{stem}-cropped.{}", format.extension())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Rotation;
    use crate::services::cache::CacheState;
    use crate::services::progress::NoProgress;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    fn png_source(width: u32, height: u32) -> SourceImage {
        let image = image::RgbaImage::from_fn(width, height, |x, y| {
            image::Rgba([(x * 7) as u8, (y * 11) as u8, ((x + y) * 3) as u8, 255])
        });
        let mut bytes = Vec::new();
        image
            .write_to(&mut std::io::Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        SourceImage::new("photo.png", bytes)
    }

    fn png_pipeline() -> Pipeline {
        Pipeline::new(PipelineConfig {
            output_format: OutputFormat::Png,
            optimize_png: false,
            ..Default::default()
        })
    }

    #[test]
    fn test_cropped_name() {
        assert_eq!(cropped_name("holiday.jpeg", OutputFormat::Jpeg), "holiday-cropped.jpg");
        assert_eq!(cropped_name("scan", OutputFormat::Png), "scan-cropped.png");
    }

    #[tokio::test]
    async fn test_process_then_cache_hit() {
        let pipeline = png_pipeline();
        let mut cache = pipeline.new_cache();
        let source = png_source(20, 10);
        let options = ProcessingOptions::default();

        let first = pipeline
            .process(&mut cache, &source, &options, &NoProgress)
            .await
            .unwrap();
        assert!(!first.from_cache);
        assert_eq!(cache.state(), CacheState::Valid);

        let second = pipeline
            .process(&mut cache, &source, &options, &NoProgress)
            .await
            .unwrap();
        assert!(second.from_cache);
        assert_eq!(second.bytes, first.bytes);
    }

    #[tokio::test]
    async fn test_cache_hit_keeps_palette_and_reports_cached_palette() {
        let pipeline = png_pipeline();
        let mut cache = pipeline.new_cache();
        let source = png_source(12, 12);
        let dithered = ProcessingOptions {
            apply_dithering: true,
            color_count: 4,
            ..Default::default()
        };

        let first = pipeline
            .process(&mut cache, &source, &dithered, &NoProgress)
            .await
            .unwrap();
        let hit = pipeline
            .process(&mut cache, &source, &dithered, &NoProgress)
            .await
            .unwrap();
        assert!(hit.from_cache);
        assert!(first.palette.is_some());
        assert_eq!(hit.palette, first.palette);

        // Toggling blur reruns the stages but the palette comes from the store
        let events = Mutex::new(Vec::new());
        let reporter = |step: &str, _percent: u8| {
            events.lock().unwrap().push(step.to_string());
        };
        let blurred = ProcessingOptions {
            apply_blur: true,
            ..dithered
        };
        let rerun = pipeline
            .process(&mut cache, &source, &blurred, &reporter)
            .await
            .unwrap();
        assert_eq!(rerun.palette, first.palette);
        let events = events.lock().unwrap();
        assert!(events.iter().any(|s| s == "palette-cached"));
        assert!(!events.iter().any(|s| s == "palette"));
    }

    #[tokio::test]
    async fn test_progress_order() {
        let pipeline = png_pipeline();
        let mut cache = pipeline.new_cache();
        let events = Mutex::new(Vec::new());
        let reporter = |step: &str, percent: u8| {
            events.lock().unwrap().push(format!("{step}:{percent}"));
        };
        let options = ProcessingOptions {
            apply_dithering: true,
            apply_blur: true,
            rotation: Rotation::Half,
            ..Default::default()
        };

        pipeline
            .process(&mut cache, &png_source(8, 8), &options, &reporter)
            .await
            .unwrap();

        assert_eq!(
            *events.lock().unwrap(),
            vec![
                "compress:0",
                "compress:100",
                "decode:0",
                "decode:100",
                "rotate:0",
                "rotate:100",
                "quantize:0",
                "palette:0",
                "palette:100",
                "quantize:100",
                "detect-faces:0",
                "detect-faces:100",
                "blur:0",
                "blur:100",
                "encode:0",
                "encode:100",
            ]
        );
    }

    #[tokio::test]
    async fn test_invalid_options_rejected_before_work() {
        let pipeline = png_pipeline();
        let mut cache = pipeline.new_cache();
        let options = ProcessingOptions {
            quality: 101,
            ..Default::default()
        };
        let result = pipeline
            .process(&mut cache, &png_source(4, 4), &options, &NoProgress)
            .await;
        assert!(matches!(result, Err(PipelineError::InvalidOptions(_))));
        assert_eq!(cache.state(), CacheState::Empty);
    }

    #[tokio::test]
    async fn test_decode_failure_keeps_cache() {
        let pipeline = png_pipeline();
        let mut cache = pipeline.new_cache();
        let good = png_source(6, 6);
        let options = ProcessingOptions::default();
        pipeline
            .process(&mut cache, &good, &options, &NoProgress)
            .await
            .unwrap();

        let garbage = SourceImage::new("broken.jpg", b"not an image".to_vec());
        let result = pipeline
            .process(&mut cache, &garbage, &options, &NoProgress)
            .await;
        assert!(result.is_err());
        assert_eq!(cache.last_source(), Some(good.id()));
    }

    #[test]
    fn test_crop_png_source() {
        let pipeline = png_pipeline();
        let source = png_source(40, 20);
        let rect = CropRect {
            x: 0.25,
            y: 0.5,
            width: 0.5,
            height: 0.5,
        };

        let cropped = pipeline.crop(&source, rect, 90).unwrap();
        assert_ne!(cropped.id(), source.id());
        assert_eq!(cropped.name(), "photo-cropped.png");

        let decoded = image::load_from_memory(cropped.bytes()).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (20, 10));
        let original = image::load_from_memory(source.bytes()).unwrap().to_rgba8();
        assert_eq!(decoded.get_pixel(0, 0), original.get_pixel(10, 10));
    }

    #[test]
    fn test_crop_rejects_invalid_rect() {
        let pipeline = png_pipeline();
        let rect = CropRect {
            x: 0.5,
            y: 0.0,
            width: 0.8,
            height: 1.0,
        };
        assert!(matches!(
            pipeline.crop(&png_source(4, 4), rect, 75),
            Err(PipelineError::InvalidCrop(_))
        ));
    }

    #[tokio::test]
    async fn test_default_metadata_is_empty() {
        let pipeline = Pipeline::default();
        let meta = pipeline.metadata(&png_source(2, 2)).await.unwrap();
        assert!(!meta.has_metadata());
    }
}
