//! Final encode of a processed bitmap.
//!
//! JPEG output drops alpha. PNG output is written as an indexed image with a
//! `tRNS` chunk whenever the bitmap has at most 256 distinct RGBA values, and
//! as RGBA8 otherwise. Quantization bounds the RGB colors but not alpha, so a
//! quantized bitmap with varying transparency can still take the RGBA8 path.

use std::collections::HashMap;
use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::ExtendedColorType;

use crate::error::EncodeError;
use crate::models::{Bitmap, OutputFormat};

const MAX_PNG_PALETTE: usize = 256;

/// Encode `bitmap` as `format`.
///
/// `quality` applies to JPEG only and is clamped to 1..=100. `optimize_png`
/// runs oxipng over PNG output; if oxipng fails the unoptimized bytes are
/// returned.
pub fn encode(
    bitmap: &Bitmap,
    format: OutputFormat,
    quality: u8,
    optimize_png: bool,
) -> Result<Vec<u8>, EncodeError> {
    if bitmap.is_empty() {
        return Err(EncodeError::EmptyBitmap);
    }

    match format {
        OutputFormat::Jpeg => encode_jpeg(bitmap, quality.clamp(1, 100)),
        OutputFormat::Png => {
            let png = encode_png(bitmap)?;
            if !optimize_png {
                return Ok(png);
            }
            let optimized = oxipng::optimize_from_memory(
                &png,
                &oxipng::Options {
                    strip: oxipng::StripChunks::Safe,
                    optimize_alpha: false,
                    ..Default::default()
                },
            );
            Ok(optimized.unwrap_or(png))
        }
    }
}

fn encode_jpeg(bitmap: &Bitmap, quality: u8) -> Result<Vec<u8>, EncodeError> {
    let rgb: Vec<u8> = bitmap
        .as_raw()
        .chunks_exact(4)
        .flat_map(|px| [px[0], px[1], px[2]])
        .collect();

    let mut out = Vec::new();
    JpegEncoder::new_with_quality(Cursor::new(&mut out), quality)
        .encode(&rgb, bitmap.width(), bitmap.height(), ExtendedColorType::Rgb8)
        .map_err(|e| EncodeError::Jpeg(e.to_string()))?;
    Ok(out)
}

fn encode_png(bitmap: &Bitmap) -> Result<Vec<u8>, EncodeError> {
    let (width, height) = (bitmap.width(), bitmap.height());

    let Some((table, indices)) = index_colors(bitmap.as_raw()) else {
        return write_png(
            width,
            height,
            png::ColorType::Rgba,
            png::BitDepth::Eight,
            None,
            bitmap.as_raw(),
        );
    };

    let (depth, bits) = match table.len() {
        0..=2 => (png::BitDepth::One, 1),
        3..=4 => (png::BitDepth::Two, 2),
        5..=16 => (png::BitDepth::Four, 4),
        _ => (png::BitDepth::Eight, 8),
    };
    let packed = if bits < 8 {
        pack_nbits(&indices, width, bits)
    } else {
        indices
    };

    let plte: Vec<u8> = table.iter().flat_map(|c| [c[0], c[1], c[2]]).collect();
    let trns: Vec<u8> = table.iter().map(|c| c[3]).collect();
    let trns = trns.iter().any(|&a| a != 255).then_some(trns);

    write_png(
        width,
        height,
        png::ColorType::Indexed,
        depth,
        Some((&plte, trns.as_deref())),
        &packed,
    )
}

/// Build a color table and per-pixel indices, or `None` if the image has
/// more distinct RGBA values than fit in a PNG palette.
fn index_colors(rgba: &[u8]) -> Option<(Vec<[u8; 4]>, Vec<u8>)> {
    let mut lookup: HashMap<[u8; 4], u8> = HashMap::new();
    let mut table = Vec::new();
    let mut indices = Vec::with_capacity(rgba.len() / 4);

    for px in rgba.chunks_exact(4) {
        let color = [px[0], px[1], px[2], px[3]];
        let index = match lookup.get(&color) {
            Some(&i) => i,
            None => {
                if table.len() == MAX_PNG_PALETTE {
                    return None;
                }
                let i = table.len() as u8;
                table.push(color);
                lookup.insert(color, i);
                i
            }
        };
        indices.push(index);
    }

    Some((table, indices))
}

fn write_png(
    width: u32,
    height: u32,
    color_type: png::ColorType,
    bit_depth: png::BitDepth,
    palette: Option<(&[u8], Option<&[u8]>)>,
    data: &[u8],
) -> Result<Vec<u8>, EncodeError> {
    let mut buf = Cursor::new(Vec::new());
    {
        let mut encoder = png::Encoder::new(&mut buf, width, height);
        encoder.set_color(color_type);
        encoder.set_depth(bit_depth);
        encoder.set_compression(png::Compression::Fast);
        encoder.set_filter(png::FilterType::NoFilter);
        if let Some((plte, trns)) = palette {
            encoder.set_palette(plte);
            if let Some(trns) = trns {
                encoder.set_trns(trns);
            }
        }
        let mut writer = encoder
            .write_header()
            .map_err(|e| EncodeError::Png(e.to_string()))?;
        writer
            .write_image_data(data)
            .map_err(|e| EncodeError::Png(e.to_string()))?;
    }
    Ok(buf.into_inner())
}

/// Pack palette indices into N-bit PNG rows (1, 2 or 4 bits per pixel).
fn pack_nbits(indices: &[u8], width: u32, bits: u8) -> Vec<u8> {
    let per_byte = 8 / bits as usize;
    let row_bytes = (width as usize).div_ceil(per_byte);
    let mask = (1u8 << bits) - 1;
    let mut packed = Vec::with_capacity(row_bytes * (indices.len() / width as usize));

    for row in indices.chunks(width as usize) {
        for group in row.chunks(per_byte) {
            let byte = group.iter().enumerate().fold(0u8, |acc, (i, &idx)| {
                acc | ((idx & mask) << (8 - bits - i as u8 * bits))
            });
            packed.push(byte);
        }
    }

    packed
}
