//! Test images and option sets.

use std::io::Cursor;

use darkroom::models::{Bitmap, ProcessingOptions, SourceImage};
use image::{ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Smooth opaque RGB gradient with some diagonal texture
pub fn gradient_rgb(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([
            (x * 255 / width.max(1)) as u8,
            (y * 255 / height.max(1)) as u8,
            ((x + 2 * y) % 256) as u8,
        ])
    })
}

/// Gradient whose alpha varies across the image
pub fn gradient_rgba(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        Rgba([
            (x * 255 / width.max(1)) as u8,
            (y * 255 / height.max(1)) as u8,
            128,
            ((x * 7 + y * 13) % 256) as u8,
        ])
    })
}

pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut out = Vec::new();
    gradient_rgb(width, height)
        .write_to(&mut Cursor::new(&mut out), ImageFormat::Jpeg)
        .expect("encode JPEG fixture");
    out
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut out = Vec::new();
    gradient_rgba(width, height)
        .write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
        .expect("encode PNG fixture");
    out
}

pub fn jpeg_source(width: u32, height: u32) -> SourceImage {
    SourceImage::new("photo.jpg", jpeg_bytes(width, height))
}

pub fn png_source(width: u32, height: u32) -> SourceImage {
    SourceImage::new("graphic.png", png_bytes(width, height))
}

/// Bitmap with uniformly random RGBA values, reproducible per seed
pub fn random_bitmap(width: u32, height: u32, seed: u64) -> Bitmap {
    let mut rng = StdRng::seed_from_u64(seed);
    let raw: Vec<u8> = (0..width * height * 4).map(|_| rng.gen()).collect();
    Bitmap::from_raw(width, height, raw).expect("valid random bitmap")
}

pub fn gradient_bitmap(width: u32, height: u32) -> Bitmap {
    Bitmap::from_rgba_image(gradient_rgba(width, height))
}

pub fn dithering(color_count: u8) -> ProcessingOptions {
    ProcessingOptions {
        apply_dithering: true,
        color_count,
        ..Default::default()
    }
}

/// Four flat quadrants in distinct colors
pub fn quadrant_png_source(size: u32) -> SourceImage {
    const COLORS: [[u8; 3]; 4] = [[200, 30, 30], [30, 200, 30], [30, 30, 200], [240, 240, 240]];
    let half = size / 2;
    let image = RgbImage::from_fn(size, size, |x, y| {
        let quadrant = (x >= half) as usize + 2 * (y >= half) as usize;
        Rgb(COLORS[quadrant])
    });
    let mut out = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
        .expect("encode PNG fixture");
    SourceImage::new("quadrants.png", out)
}

/// One TIFF field value
pub enum TiffValue {
    Ascii(&'static str),
    Short(u16),
    Rationals(Vec<(u32, u32)>),
    /// Offset of another IFD in the same block, by index
    Ifd(usize),
}

/// Little-endian TIFF block holding `ifds` back to back, values after them.
///
/// Entries of each IFD must be sorted by tag.
pub fn tiff_block(ifds: &[Vec<(u16, TiffValue)>]) -> Vec<u8> {
    let mut offsets = Vec::with_capacity(ifds.len());
    let mut data_start = 8u32;
    for ifd in ifds {
        offsets.push(data_start);
        data_start += 2 + 12 * ifd.len() as u32 + 4;
    }

    let mut out = b"II*\0".to_vec();
    out.extend(8u32.to_le_bytes());
    let mut data = Vec::new();
    for ifd in ifds {
        out.extend((ifd.len() as u16).to_le_bytes());
        for (tag, value) in ifd {
            let (kind, count, payload): (u16, u32, Vec<u8>) = match value {
                TiffValue::Ascii(text) => {
                    let mut bytes = text.as_bytes().to_vec();
                    bytes.push(0);
                    (2, bytes.len() as u32, bytes)
                }
                TiffValue::Short(v) => (3, 1, v.to_le_bytes().to_vec()),
                TiffValue::Rationals(parts) => (
                    5,
                    parts.len() as u32,
                    parts
                        .iter()
                        .flat_map(|(num, den)| [num.to_le_bytes(), den.to_le_bytes()].concat())
                        .collect(),
                ),
                TiffValue::Ifd(index) => (4, 1, offsets[*index].to_le_bytes().to_vec()),
            };
            out.extend(tag.to_le_bytes());
            out.extend(kind.to_le_bytes());
            out.extend(count.to_le_bytes());
            if payload.len() <= 4 {
                let mut inline = payload;
                inline.resize(4, 0);
                out.extend(inline);
            } else {
                out.extend((data_start + data.len() as u32).to_le_bytes());
                data.extend(payload);
                if data.len() % 2 == 1 {
                    data.push(0);
                }
            }
        }
        out.extend(0u32.to_le_bytes());
    }
    out.extend(data);
    out
}

/// Insert an APP1 Exif segment right after the JPEG SOI marker
pub fn with_exif(jpeg: &[u8], tiff: &[u8]) -> Vec<u8> {
    let length = (2 + 6 + tiff.len()) as u16;
    let mut out = jpeg[..2].to_vec();
    out.extend([0xFF, 0xE1]);
    out.extend(length.to_be_bytes());
    out.extend(b"Exif\0\0");
    out.extend(tiff);
    out.extend(&jpeg[2..]);
    out
}

/// JPEG shot on a phone: stored `width`x`height`, with camera, exposure
/// and GPS fields and the given Orientation tag.
pub fn phone_jpeg(width: u32, height: u32, orientation: u16) -> Vec<u8> {
    let primary = vec![
        (0x010F, TiffValue::Ascii("Darkroom Optics")),
        (0x0110, TiffValue::Ascii("DR-1")),
        (0x0112, TiffValue::Short(orientation)),
        (0x8769, TiffValue::Ifd(1)),
        (0x8825, TiffValue::Ifd(2)),
    ];
    let exif = vec![
        (0x829A, TiffValue::Rationals(vec![(1, 250)])),
        (0x829D, TiffValue::Rationals(vec![(28, 10)])),
        (0x8827, TiffValue::Short(400)),
        (0x9003, TiffValue::Ascii("2024:05:17 14:30:00")),
        (0x920A, TiffValue::Rationals(vec![(50, 1)])),
    ];
    let gps = vec![
        (0x0001, TiffValue::Ascii("N")),
        (0x0002, TiffValue::Rationals(vec![(47, 1), (30, 1), (36, 1)])),
        (0x0003, TiffValue::Ascii("W")),
        (0x0004, TiffValue::Rationals(vec![(8, 1), (15, 1), (0, 1)])),
    ];
    with_exif(&jpeg_bytes(width, height), &tiff_block(&[primary, exif, gps]))
}
