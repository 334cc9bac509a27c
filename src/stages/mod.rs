//! Bitmap transformation stages.
//!
//! A run is planned as an ordered list of [`Stage`]s built once from the
//! options and folded left to right over the bitmap. Rotation always comes
//! first because quantization's scan order and the face boxes' coordinates
//! are both defined on the rotated frame.

pub mod blur;
pub mod encode;
pub mod quantize;
pub mod rotate;

pub use blur::{blur, padded_region, BlurSettings, Region};
pub use encode::encode;
pub use quantize::{quantize, QuantizeOutcome, TransparencyMap};
pub use rotate::rotate;

use crate::error::PipelineError;
use crate::models::{Bitmap, ProcessingOptions, Rotation};
use crate::services::camera;
use crate::services::progress::steps;

/// One content-mutating step of a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Rotate(Rotation),
    Quantize { color_count: u8 },
    Blur,
}

impl Stage {
    /// Stages for `options`, in execution order.
    ///
    /// Always starts with `Rotate`; `Quantize` follows only when dithering is
    /// on and `Blur` only when blurring is on.
    pub fn plan(options: &ProcessingOptions) -> Vec<Stage> {
        let mut stages = vec![Stage::Rotate(options.rotation)];
        if options.apply_dithering {
            stages.push(Stage::Quantize {
                color_count: options.effective_color_count(),
            });
        }
        if options.apply_blur {
            stages.push(Stage::Blur);
        }
        stages
    }

    /// Progress label for this stage.
    pub fn label(&self) -> &'static str {
        match self {
            Stage::Rotate(_) => steps::ROTATE,
            Stage::Quantize { .. } => steps::QUANTIZE,
            Stage::Blur => steps::BLUR,
        }
    }
}

/// Decode an encoded image into an upright bitmap.
pub fn decode(bytes: &[u8]) -> Result<Bitmap, PipelineError> {
    let image = camera::decode_upright(bytes).map_err(|e| PipelineError::Decode(e.to_string()))?;
    let bitmap = Bitmap::from_rgba_image(image.to_rgba8());
    if bitmap.is_empty() {
        return Err(PipelineError::EmptyBitmap);
    }
    Ok(bitmap)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_plan_rotation_only() {
        let plan = Stage::plan(&ProcessingOptions::default());
        assert_eq!(plan, vec![Stage::Rotate(Rotation::None)]);
    }

    #[test]
    fn test_plan_full_order() {
        let options = ProcessingOptions {
            apply_dithering: true,
            color_count: 100,
            apply_blur: true,
            rotation: Rotation::Quarter,
            ..Default::default()
        };
        assert_eq!(
            Stage::plan(&options),
            vec![
                Stage::Rotate(Rotation::Quarter),
                Stage::Quantize { color_count: 32 },
                Stage::Blur,
            ]
        );
    }

    #[test]
    fn test_plan_blur_without_dither() {
        let options = ProcessingOptions {
            apply_blur: true,
            ..Default::default()
        };
        assert_eq!(
            Stage::plan(&options),
            vec![Stage::Rotate(Rotation::None), Stage::Blur]
        );
    }

    #[test]
    fn test_labels() {
        assert_eq!(Stage::Rotate(Rotation::Half).label(), "rotate");
        assert_eq!(Stage::Quantize { color_count: 2 }.label(), "quantize");
        assert_eq!(Stage::Blur.label(), "blur");
    }

    #[test]
    fn test_decode_garbage() {
        assert!(matches!(decode(b"nope"), Err(PipelineError::Decode(_))));
    }
}
