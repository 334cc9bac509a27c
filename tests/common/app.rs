//! Test harness bundling a pipeline, its cache and a progress recorder.

use std::sync::{Arc, Mutex};

use darkroom::error::PipelineError;
use darkroom::models::{OutputFormat, PipelineConfig, ProcessedImage, ProcessingOptions, SourceImage};
use darkroom::services::{Pipeline, ProcessingCache, ProgressReporter};

/// Collects `(step, percent)` events
#[derive(Debug, Default, Clone)]
pub struct RecordingProgress {
    events: Arc<Mutex<Vec<(String, u8)>>>,
}

impl RecordingProgress {
    pub fn events(&self) -> Vec<(String, u8)> {
        self.events.lock().unwrap().clone()
    }

    pub fn steps(&self) -> Vec<String> {
        let mut steps: Vec<String> = Vec::new();
        for (step, _) in self.events() {
            if steps.last() != Some(&step) {
                steps.push(step);
            }
        }
        steps
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }
}

impl ProgressReporter for RecordingProgress {
    fn report(&self, step: &str, percent: u8) {
        self.events.lock().unwrap().push((step.to_string(), percent));
    }
}

/// A pipeline together with the cache a caller would own
pub struct TestApp {
    pub pipeline: Pipeline,
    pub cache: ProcessingCache,
    pub progress: RecordingProgress,
}

impl TestApp {
    /// Lossless PNG output without oxipng so pixel checks stay exact and fast
    pub fn new() -> Self {
        Self::with_config(Self::png_config())
    }

    pub fn png_config() -> PipelineConfig {
        PipelineConfig {
            output_format: OutputFormat::Png,
            optimize_png: false,
            ..Default::default()
        }
    }

    pub fn with_config(config: PipelineConfig) -> Self {
        Self::with_pipeline(Pipeline::new(config))
    }

    pub fn with_pipeline(pipeline: Pipeline) -> Self {
        let cache = pipeline.new_cache();
        Self {
            pipeline,
            cache,
            progress: RecordingProgress::default(),
        }
    }

    pub async fn process(
        &mut self,
        source: &SourceImage,
        options: &ProcessingOptions,
    ) -> Result<ProcessedImage, PipelineError> {
        self.pipeline
            .process(&mut self.cache, source, options, &self.progress)
            .await
    }
}
