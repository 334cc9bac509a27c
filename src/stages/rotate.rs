use image::imageops;

use crate::models::{Bitmap, Rotation};

/// Rotate clockwise about the image center by a quarter-turn multiple.
///
/// 90 and 270 swap width and height. Rotating by `None` returns the bitmap
/// untouched.
pub fn rotate(bitmap: Bitmap, rotation: Rotation) -> Bitmap {
    let rotated = match rotation {
        Rotation::None => return bitmap,
        Rotation::Quarter => imageops::rotate90(bitmap.as_rgba_image()),
        Rotation::Half => imageops::rotate180(bitmap.as_rgba_image()),
        Rotation::ThreeQuarter => imageops::rotate270(bitmap.as_rgba_image()),
    };
    tracing::debug!(
        degrees = rotation.degrees(),
        width = rotated.width(),
        height = rotated.height(),
        "Rotated bitmap"
    );
    Bitmap::from_rgba_image(rotated)
}
