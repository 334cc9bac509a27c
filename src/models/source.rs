use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

static NEXT_SOURCE_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of one loaded source image.
///
/// Two sources are "the same file" only if they share an id, regardless of
/// their bytes. Cloning a [`SourceImage`] keeps its id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceId(u64);

impl SourceId {
    fn next() -> Self {
        SourceId(NEXT_SOURCE_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

/// An uploaded (or cropped) image file, still encoded.
#[derive(Debug, Clone)]
pub struct SourceImage {
    id: SourceId,
    name: String,
    bytes: Arc<[u8]>,
}

impl SourceImage {
    pub fn new(name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            id: SourceId::next(),
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    pub fn id(&self) -> SourceId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Shared handle to the encoded bytes, for moving into blocking tasks.
    pub fn shared_bytes(&self) -> Arc<[u8]> {
        Arc::clone(&self.bytes)
    }

    pub fn size_bytes(&self) -> usize {
        self.bytes.len()
    }
}

/// A crop rectangle in normalized coordinates (fractions of width/height).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl CropRect {
    /// The whole image.
    pub const FULL: Self = Self {
        x: 0.0,
        y: 0.0,
        width: 1.0,
        height: 1.0,
    };

    pub fn validate(&self) -> Result<(), PipelineError> {
        let fields = [self.x, self.y, self.width, self.height];
        if fields.iter().any(|v| !v.is_finite()) {
            return Err(PipelineError::InvalidCrop("non-finite coordinate".into()));
        }
        if self.x < 0.0 || self.y < 0.0 {
            return Err(PipelineError::InvalidCrop("negative origin".into()));
        }
        if self.width <= 0.0 || self.height <= 0.0 {
            return Err(PipelineError::InvalidCrop("empty rectangle".into()));
        }
        // Small tolerance for float round-off from UI drag handles
        if self.x + self.width > 1.0 + 1e-4 || self.y + self.height > 1.0 + 1e-4 {
            return Err(PipelineError::InvalidCrop(
                "rectangle extends past the image".into(),
            ));
        }
        Ok(())
    }

    /// Convert to a pixel rectangle `(x, y, width, height)` inside an image of
    /// the given size. The result is at least 1x1 and never leaves the image.
    pub fn to_pixels(&self, image_width: u32, image_height: u32) -> (u32, u32, u32, u32) {
        let px = |v: f32, extent: u32| ((v * extent as f32).round().max(0.0) as u32).min(extent);

        let x = px(self.x, image_width).min(image_width.saturating_sub(1));
        let y = px(self.y, image_height).min(image_height.saturating_sub(1));
        let w = px(self.width, image_width).clamp(1, image_width.saturating_sub(x).max(1));
        let h = px(self.height, image_height).clamp(1, image_height.saturating_sub(y).max(1));
        (x, y, w, h)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_ids_are_unique() {
        let a = SourceImage::new("a.jpg", vec![1u8, 2, 3]);
        let b = SourceImage::new("a.jpg", vec![1u8, 2, 3]);
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_clone_keeps_id() {
        let a = SourceImage::new("a.jpg", vec![1u8]);
        let b = a.clone();
        assert_eq!(a.id(), b.id());
        assert_eq!(b.name(), "a.jpg");
        assert_eq!(b.size_bytes(), 1);
    }

    #[test]
    fn test_crop_validate() {
        assert!(CropRect::FULL.validate().is_ok());
        let bad = [
            CropRect { x: -0.1, ..CropRect::FULL },
            CropRect { width: 0.0, ..CropRect::FULL },
            CropRect { x: 0.5, width: 0.6, ..CropRect::FULL },
            CropRect { y: f32::NAN, ..CropRect::FULL },
        ];
        for rect in bad {
            assert!(rect.validate().is_err(), "{rect:?} should be rejected");
        }
    }

    #[test]
    fn test_crop_to_pixels() {
        let rect = CropRect {
            x: 0.25,
            y: 0.5,
            width: 0.5,
            height: 0.5,
        };
        assert_eq!(rect.to_pixels(200, 100), (50, 50, 100, 50));
        assert_eq!(CropRect::FULL.to_pixels(7, 3), (0, 0, 7, 3));
    }

    #[test]
    fn test_crop_to_pixels_never_empty() {
        let rect = CropRect {
            x: 0.0,
            y: 0.0,
            width: 0.001,
            height: 0.001,
        };
        assert_eq!(rect.to_pixels(10, 10), (0, 0, 1, 1));
    }
}
