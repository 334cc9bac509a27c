pub mod bitmap;
pub mod config;
pub mod options;
pub mod output;
pub mod source;

pub use bitmap::Bitmap;
pub use config::PipelineConfig;
pub use options::{ProcessingOptions, Rotation, MAX_COLORS, MIN_COLORS};
pub use output::{compression_ratio, format_file_size, ImageStats, OutputFormat, ProcessedImage};
pub use source::{CropRect, SourceId, SourceImage};
