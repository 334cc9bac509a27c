//! Assertion helpers for tests.

use std::collections::HashSet;

use darkroom::models::Bitmap;
use image::RgbaImage;
use pretty_assertions::assert_eq;

/// Assert bytes are a JPEG file
pub fn assert_jpeg(bytes: &[u8]) {
    assert!(
        bytes.starts_with(&[0xFF, 0xD8, 0xFF]),
        "Expected JPEG, got {} bytes starting with {:?}",
        bytes.len(),
        &bytes[..8.min(bytes.len())]
    );
}

/// Assert bytes are a PNG file
pub fn assert_png(bytes: &[u8]) {
    assert!(
        bytes.starts_with(&[0x89, b'P', b'N', b'G']),
        "Expected PNG, got {} bytes starting with {:?}",
        bytes.len(),
        &bytes[..8.min(bytes.len())]
    );
}

pub fn decode_rgba(bytes: &[u8]) -> RgbaImage {
    image::load_from_memory(bytes)
        .expect("output should decode")
        .to_rgba8()
}

pub fn distinct_rgb(image: &RgbaImage) -> usize {
    image
        .pixels()
        .map(|p| [p.0[0], p.0[1], p.0[2]])
        .collect::<HashSet<_>>()
        .len()
}

/// Assert both bitmaps have the same alpha at every pixel
pub fn assert_alpha_eq(actual: &Bitmap, expected: &Bitmap) {
    assert_eq!(
        (actual.width(), actual.height()),
        (expected.width(), expected.height())
    );
    let mismatches = actual
        .alpha_channel()
        .iter()
        .zip(expected.alpha_channel())
        .filter(|(a, b)| **a != *b)
        .count();
    assert_eq!(mismatches, 0, "{mismatches} pixels changed alpha");
}
