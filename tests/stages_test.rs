//! Property tests for the individual bitmap stages.

mod common;

use darkroom::models::Rotation;
use darkroom::services::{content_hash, Detection, NoProgress, PaletteStore};
use darkroom::stages::{blur, padded_region, quantize, rotate, BlurSettings, Region};
use pretty_assertions::assert_eq;
use quantize_dither::{MedianCut, Quantizer};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use common::fixtures;
use common::mocks::{CountingBuilder, FailingBuilder};

#[test]
fn test_rotation_four_quarters_is_identity() {
    for (i, (w, h)) in [(1, 1), (3, 7), (16, 9), (31, 2)].into_iter().enumerate() {
        let original = fixtures::random_bitmap(w, h, i as u64);
        let mut bitmap = original.clone();
        for _ in 0..4 {
            bitmap = rotate(bitmap, Rotation::Quarter);
        }
        assert_eq!(bitmap, original, "{w}x{h}");
    }
}

#[test]
fn test_rotation_half_twice_is_identity() {
    let original = fixtures::random_bitmap(13, 5, 42);
    let turned = rotate(rotate(original.clone(), Rotation::Half), Rotation::Half);
    assert_eq!(turned, original);
}

#[test]
fn test_quarter_turns_swap_dimensions() {
    let bitmap = fixtures::random_bitmap(20, 8, 1);
    for rotation in [Rotation::Quarter, Rotation::ThreeQuarter] {
        let out = rotate(bitmap.clone(), rotation);
        assert_eq!((out.width(), out.height()), (8, 20));
    }
    let out = rotate(bitmap, Rotation::Half);
    assert_eq!((out.width(), out.height()), (20, 8));
}

#[test]
fn test_quantize_preserves_alpha_for_every_color_count() {
    let original = fixtures::random_bitmap(24, 16, 7);
    let hash = content_hash(&original);
    let quantizer = Quantizer::new();

    for color_count in 2..=32u8 {
        let mut store = PaletteStore::new(8);
        let outcome = quantize(
            original.clone(),
            color_count,
            &mut store,
            &hash,
            &MedianCut,
            &quantizer,
            &NoProgress,
        );
        assert!(!outcome.is_failed(), "color_count {color_count}");
        common::assert_alpha_eq(outcome.bitmap(), &original);
        assert!(outcome.bitmap().distinct_rgb_colors() <= color_count as usize);
    }
}

#[test]
fn test_quantize_clamps_color_count() {
    let original = fixtures::gradient_bitmap(32, 32);
    let hash = content_hash(&original);
    let quantizer = Quantizer::new();

    let run = |count: u8| {
        let mut store = PaletteStore::new(8);
        let bitmap = quantize(
            original.clone(),
            count,
            &mut store,
            &hash,
            &MedianCut,
            &quantizer,
            &NoProgress,
        )
        .into_bitmap();
        (bitmap, store)
    };

    let (low, low_store) = run(1);
    let (two, _) = run(2);
    assert_eq!(low, two);
    assert!(low_store.contains(&PaletteStore::key(&hash, 2)));

    let (high, high_store) = run(100);
    let (max, _) = run(32);
    assert_eq!(high, max);
    assert!(high_store.contains(&PaletteStore::key(&hash, 32)));
}

#[test]
fn test_palette_store_skips_rebuild() {
    let original = fixtures::random_bitmap(40, 30, 9);
    let hash = content_hash(&original);
    let builder = CountingBuilder::new();
    let quantizer = Quantizer::new();
    let mut store = PaletteStore::new(8);

    let first = quantize(
        original.clone(),
        6,
        &mut store,
        &hash,
        &*builder,
        &quantizer,
        &NoProgress,
    )
    .into_bitmap();
    let second = quantize(
        original.clone(),
        6,
        &mut store,
        &hash,
        &*builder,
        &quantizer,
        &NoProgress,
    )
    .into_bitmap();

    assert_eq!(builder.calls(), 1);
    assert_eq!(first, second);

    // A different count is a different palette
    quantize(
        original,
        7,
        &mut store,
        &hash,
        &*builder,
        &quantizer,
        &NoProgress,
    );
    assert_eq!(builder.calls(), 2);
    assert_eq!(store.len(), 2);
}

#[test]
fn test_palette_failure_returns_input() {
    let original = fixtures::gradient_bitmap(8, 8);
    let hash = content_hash(&original);
    let mut store = PaletteStore::new(8);

    let outcome = quantize(
        original.clone(),
        4,
        &mut store,
        &hash,
        &FailingBuilder,
        &Quantizer::new(),
        &NoProgress,
    );
    assert!(outcome.is_failed());
    assert_eq!(outcome.into_bitmap(), original);
    assert!(store.is_empty());
}

#[test]
fn test_blur_never_touches_pixels_outside_padded_boxes() {
    let mut rng = StdRng::seed_from_u64(2024);
    let settings = BlurSettings::default();

    for round in 0..10 {
        let (width, height) = (rng.gen_range(8..64), rng.gen_range(8..64));
        let original = fixtures::random_bitmap(width, height, round);
        let detections: Vec<Detection> = (0..rng.gen_range(1..4))
            .map(|_| {
                Detection::new(
                    rng.gen_range(-10.0..width as f32),
                    rng.gen_range(-10.0..height as f32),
                    rng.gen_range(1.0..20.0),
                    rng.gen_range(1.0..20.0),
                )
            })
            .collect();
        let regions: Vec<Region> = detections
            .iter()
            .filter_map(|d| padded_region(d, width, height, settings.margin_ratio))
            .collect();

        let blurred = blur(original.clone(), &detections, &settings);

        for y in 0..height {
            for x in 0..width {
                if !regions.iter().any(|r| r.contains(x, y)) {
                    assert_eq!(
                        blurred.pixel(x, y),
                        original.pixel(x, y),
                        "round {round}: pixel ({x},{y}) outside {regions:?} changed"
                    );
                }
            }
        }
    }
}

#[test]
fn test_blur_margin_is_thirty_percent_of_longer_side() {
    let d = Detection::new(100.0, 100.0, 50.0, 20.0);
    let region = padded_region(&d, 1000, 1000, BlurSettings::default().margin_ratio).unwrap();
    assert_eq!(
        region,
        Region {
            x: 85,
            y: 85,
            width: 80,
            height: 50,
        }
    );
}
