use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use super::OutputFormat;

/// Pipeline configuration loaded from a YAML file.
///
/// Every field has a default, so an empty file (or no file) is a valid
/// configuration.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Format of the final encoded image
    #[serde(default)]
    pub output_format: OutputFormat,

    /// Size the compressor tries to get under, in bytes
    #[serde(default = "default_target_size")]
    pub target_size_bytes: usize,

    /// Quality floor when the compressor steps down to hit the size target
    #[serde(default = "default_min_quality")]
    pub min_quality: u8,

    /// Minimum confidence passed to the face detector
    #[serde(default = "default_min_confidence")]
    pub detector_min_confidence: f32,

    /// Seconds before an unresponsive face detector is abandoned (0 = wait forever)
    #[serde(default = "default_detector_timeout")]
    pub detector_timeout_secs: u64,

    /// Seconds before an unresponsive compressor fails the run (0 = wait forever)
    #[serde(default = "default_compression_timeout")]
    pub compression_timeout_secs: u64,

    /// Gaussian sigma of the face blur
    #[serde(default = "default_blur_sigma")]
    pub blur_sigma: f32,

    /// Margin around each face box as a fraction of its longer side
    #[serde(default = "default_blur_margin")]
    pub blur_margin_ratio: f32,

    /// Number of palettes kept in the LRU palette store
    #[serde(default = "default_palette_capacity")]
    pub palette_cache_capacity: usize,

    /// Alternate scan direction per row while dithering
    #[serde(default = "default_true")]
    pub serpentine: bool,

    /// How far accumulated dither error may push a channel out of range
    #[serde(default = "default_error_clamp")]
    pub error_clamp: f32,

    /// Re-compress PNG output with oxipng
    #[serde(default = "default_true")]
    pub optimize_png: bool,
}

fn default_target_size() -> usize {
    1024 * 1024 // 1 MiB
}

fn default_min_quality() -> u8 {
    10
}

fn default_min_confidence() -> f32 {
    0.1
}

fn default_detector_timeout() -> u64 {
    30
}

fn default_compression_timeout() -> u64 {
    60
}

fn default_blur_sigma() -> f32 {
    20.0
}

fn default_blur_margin() -> f32 {
    0.3
}

fn default_palette_capacity() -> usize {
    8
}

fn default_error_clamp() -> f32 {
    0.5
}

fn default_true() -> bool {
    true
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            output_format: OutputFormat::default(),
            target_size_bytes: default_target_size(),
            min_quality: default_min_quality(),
            detector_min_confidence: default_min_confidence(),
            detector_timeout_secs: default_detector_timeout(),
            compression_timeout_secs: default_compression_timeout(),
            blur_sigma: default_blur_sigma(),
            blur_margin_ratio: default_blur_margin(),
            palette_cache_capacity: default_palette_capacity(),
            serpentine: true,
            error_clamp: default_error_clamp(),
            optimize_png: true,
        }
    }
}

impl PipelineConfig {
    /// Load configuration from a YAML file, falling back to defaults when the
    /// file can't be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(content) => match Self::from_yaml_str(&content) {
                Ok(config) => {
                    tracing::info!(
                        path = %path.display(),
                        format = ?config.output_format,
                        "Loaded configuration"
                    );
                    config
                }
                Err(e) => {
                    tracing::warn!(%e, path = %path.display(), "Failed to parse config, using defaults");
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!(%e, path = %path.display(), "Failed to read config, using defaults");
                Self::default()
            }
        }
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, serde_yaml::Error> {
        // An empty document deserializes as null, not as an empty mapping
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml)
    }

    /// Detector timeout, or `None` when disabled.
    pub fn detector_timeout(&self) -> Option<Duration> {
        (self.detector_timeout_secs > 0).then(|| Duration::from_secs(self.detector_timeout_secs))
    }

    /// Compression timeout, or `None` when disabled.
    pub fn compression_timeout(&self) -> Option<Duration> {
        (self.compression_timeout_secs > 0)
            .then(|| Duration::from_secs(self.compression_timeout_secs))
    }
}
