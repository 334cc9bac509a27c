pub mod cache;
pub mod camera;
pub mod collaborators;
pub mod pipeline;
pub mod progress;
pub mod session;

pub use cache::{content_hash, CacheState, ContentHash, PaletteStore, ProcessingCache, Snapshot};
pub use camera::ExifMetadata;
pub use collaborators::{
    CompressionError, CompressionRequest, Compressor, Detection, DetectionError, FaceDetector,
    ImageCompressor, ImageMetadata, MetadataError, MetadataExtractor, NoFaceDetector, NoMetadata,
};
pub use pipeline::Pipeline;
pub use progress::{NoProgress, ProgressReporter};
pub use session::ImageSession;
