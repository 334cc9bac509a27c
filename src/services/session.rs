//! Caller-facing session facade.
//!
//! Holds the one source image being edited and the processing cache that
//! belongs to it. Loading a different source or cropping resets the cache.

use std::sync::Arc;

use crate::error::PipelineError;
use crate::models::{CropRect, ProcessedImage, ProcessingOptions, SourceImage};
use crate::services::cache::ProcessingCache;
use crate::services::collaborators::{ImageMetadata, MetadataError};
use crate::services::pipeline::Pipeline;
use crate::services::progress::ProgressReporter;

pub struct ImageSession {
    pipeline: Arc<Pipeline>,
    cache: ProcessingCache,
    source: Option<SourceImage>,
}

impl ImageSession {
    pub fn new(pipeline: Arc<Pipeline>) -> Self {
        let cache = pipeline.new_cache();
        Self {
            pipeline,
            cache,
            source: None,
        }
    }

    /// Make `source` the image being edited.
    ///
    /// Reloading the same source (same id) keeps the cache.
    pub fn load(&mut self, source: SourceImage) {
        let same = self.source.as_ref().map(SourceImage::id) == Some(source.id());
        if !same {
            tracing::debug!(source = source.name(), "Loaded new source image");
            self.cache.clear();
        }
        self.source = Some(source);
    }

    /// Run the pipeline over the current source.
    pub async fn process(
        &mut self,
        options: &ProcessingOptions,
        progress: &dyn ProgressReporter,
    ) -> Result<ProcessedImage, PipelineError> {
        let source = self.source.as_ref().ok_or(PipelineError::NoSource)?;
        self.pipeline
            .process(&mut self.cache, source, options, progress)
            .await
    }

    /// Crop the current source and replace it with the result.
    ///
    /// The crop is encoded at the quality of the last run, or the default
    /// quality if nothing has been processed yet.
    pub fn crop(&mut self, rect: CropRect) -> Result<&SourceImage, PipelineError> {
        let source = self.source.as_ref().ok_or(PipelineError::NoSource)?;
        let quality = self
            .cache
            .last_options()
            .map_or(ProcessingOptions::default().quality, |o| o.quality);

        let cropped = self.pipeline.crop(source, rect, quality)?;
        self.cache.clear();
        Ok(&*self.source.insert(cropped))
    }

    /// Forget the cached result and every stored palette. The source stays.
    pub fn reset(&mut self) {
        self.cache.clear();
    }

    pub fn source(&self) -> Option<&SourceImage> {
        self.source.as_ref()
    }

    pub fn cache(&self) -> &ProcessingCache {
        &self.cache
    }

    /// Camera metadata of the current source; empty when nothing is loaded.
    pub async fn metadata(&self) -> Result<ImageMetadata, MetadataError> {
        match &self.source {
            Some(source) => self.pipeline.metadata(source).await,
            None => Ok(ImageMetadata::default()),
        }
    }
}
