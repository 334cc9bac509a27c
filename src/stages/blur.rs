//! Face blur stage.
//!
//! Each detection box is padded by a margin proportional to its longer side,
//! clamped to the bitmap, and Gaussian-blurred in place. Only pixels inside
//! a padded box can change. Overlapping boxes are blurred once per box.

use image::imageops;
use serde::Serialize;

use crate::models::{Bitmap, PipelineConfig};
use crate::services::collaborators::Detection;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlurSettings {
    /// Gaussian sigma in pixels
    pub sigma: f32,
    /// Padding on every side as a fraction of `max(width, height)` of the box
    pub margin_ratio: f32,
}

impl Default for BlurSettings {
    fn default() -> Self {
        Self {
            sigma: 20.0,
            margin_ratio: 0.3,
        }
    }
}

impl From<&PipelineConfig> for BlurSettings {
    fn from(config: &PipelineConfig) -> Self {
        Self {
            sigma: config.blur_sigma,
            margin_ratio: config.blur_margin_ratio,
        }
    }
}

/// An integer pixel rectangle fully inside a bitmap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    pub fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x && x < self.x + self.width && y >= self.y && y < self.y + self.height
    }
}

/// The padded, clamped pixel region for one detection.
///
/// Returns `None` for degenerate boxes (non-finite, zero or negative size) and
/// for boxes that fall entirely outside the bitmap.
pub fn padded_region(
    detection: &Detection,
    width: u32,
    height: u32,
    margin_ratio: f32,
) -> Option<Region> {
    let Detection {
        x,
        y,
        width: w,
        height: h,
        ..
    } = *detection;
    if ![x, y, w, h].iter().all(|v| v.is_finite()) || w <= 0.0 || h <= 0.0 {
        return None;
    }

    // Whole-pixel margin
    let margin = (w.max(h) * margin_ratio.max(0.0)).round();
    let x0 = (x - margin).floor().max(0.0);
    let y0 = (y - margin).floor().max(0.0);
    let x1 = (x + w + margin).ceil().min(width as f32);
    let y1 = (y + h + margin).ceil().min(height as f32);

    if x1 <= x0 || y1 <= y0 {
        return None;
    }

    Some(Region {
        x: x0 as u32,
        y: y0 as u32,
        width: (x1 - x0) as u32,
        height: (y1 - y0) as u32,
    })
}

/// Blur every padded detection region of `bitmap`.
pub fn blur(mut bitmap: Bitmap, detections: &[Detection], settings: &BlurSettings) -> Bitmap {
    if settings.sigma <= 0.0 {
        return bitmap;
    }

    let (width, height) = (bitmap.width(), bitmap.height());
    let mut blurred = 0;
    for detection in detections {
        let Some(region) = padded_region(detection, width, height, settings.margin_ratio) else {
            tracing::debug!(?detection, "Skipping empty blur region");
            continue;
        };

        let image = bitmap.as_rgba_image_mut();
        let patch =
            imageops::crop_imm(image, region.x, region.y, region.width, region.height).to_image();
        let patch = imageops::blur(&patch, settings.sigma);
        imageops::replace(image, &patch, region.x as i64, region.y as i64);
        blurred += 1;
    }

    tracing::debug!(regions = blurred, detections = detections.len(), "Applied face blur");
    bitmap
}
