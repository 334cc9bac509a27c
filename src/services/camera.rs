//! EXIF handling: orientation on decode and camera metadata for display.
//!
//! Both read the raw file through `kamadak-exif`. A file without an EXIF
//! block is not an error: it decodes upright and has empty metadata.

use std::io::Cursor;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use exif::{Exif, Field, In, Tag, Value};
use image::{DynamicImage, ImageResult};

use crate::services::collaborators::{ImageMetadata, MetadataError, MetadataExtractor};

/// EXIF Orientation of `bytes`, 1 (upright) when absent or unreadable.
pub fn read_orientation(bytes: &[u8]) -> u32 {
    read_exif(bytes)
        .ok()
        .flatten()
        .and_then(|exif| {
            exif.get_field(Tag::Orientation, In::PRIMARY)
                .and_then(|field| field.value.get_uint(0))
        })
        .unwrap_or(1)
}

/// Transform `image` so it displays upright for the given EXIF orientation.
pub fn apply_orientation(image: DynamicImage, orientation: u32) -> DynamicImage {
    match orientation {
        2 => image.fliph(),
        3 => image.rotate180(),
        4 => image.flipv(),
        5 => image.rotate90().fliph(),
        6 => image.rotate90(),
        7 => image.rotate270().fliph(),
        8 => image.rotate270(),
        _ => image,
    }
}

/// True when `orientation` swaps the stored width and height.
pub fn swaps_dimensions(orientation: u32) -> bool {
    (5..=8).contains(&orientation)
}

/// Decode `bytes` and turn the pixels upright.
///
/// Encoders downstream never write an Orientation tag, so the result must
/// already be in display orientation.
pub fn decode_upright(bytes: &[u8]) -> ImageResult<DynamicImage> {
    let image = image::load_from_memory(bytes)?;
    let orientation = read_orientation(bytes);
    if orientation != 1 {
        tracing::debug!(orientation, "Applying EXIF orientation");
    }
    Ok(apply_orientation(image, orientation))
}

/// `Ok(None)` when the container has no EXIF block.
fn read_exif(bytes: &[u8]) -> Result<Option<Exif>, exif::Error> {
    match exif::Reader::new().read_from_container(&mut Cursor::new(bytes)) {
        Ok(exif) => Ok(Some(exif)),
        Err(exif::Error::NotFound(_)) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Metadata extractor backed by the file's EXIF block.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExifMetadata;

#[async_trait]
impl MetadataExtractor for ExifMetadata {
    async fn extract(&self, bytes: &[u8]) -> Result<ImageMetadata, MetadataError> {
        match read_exif(bytes) {
            Ok(Some(exif)) => Ok(metadata_from(&exif)),
            Ok(None) => Ok(ImageMetadata::default()),
            Err(e) => Err(MetadataError::Parse(e.to_string())),
        }
    }
}

fn metadata_from(exif: &Exif) -> ImageMetadata {
    let field = move |tag| exif.get_field(tag, In::PRIMARY);

    ImageMetadata {
        camera_make: field(Tag::Make).and_then(ascii),
        camera_model: field(Tag::Model).and_then(ascii),
        timestamp: field(Tag::DateTimeOriginal)
            .or_else(|| field(Tag::DateTime))
            .and_then(ascii)
            .and_then(|s| NaiveDateTime::parse_from_str(&s, "%Y:%m:%d %H:%M:%S").ok()),
        exposure_time: field(Tag::ExposureTime).and_then(rational),
        aperture: field(Tag::FNumber).and_then(rational),
        iso: field(Tag::PhotographicSensitivity).and_then(|f| f.value.get_uint(0)),
        focal_length: field(Tag::FocalLength).and_then(rational),
        latitude: coordinate(field(Tag::GPSLatitude), field(Tag::GPSLatitudeRef), "S"),
        longitude: coordinate(field(Tag::GPSLongitude), field(Tag::GPSLongitudeRef), "W"),
    }
}

fn ascii(field: &Field) -> Option<String> {
    let Value::Ascii(ref parts) = field.value else {
        return None;
    };
    let text = String::from_utf8_lossy(parts.first()?);
    let text = text.trim_end_matches('\0').trim();
    (!text.is_empty()).then(|| text.to_string())
}

fn rational(field: &Field) -> Option<f64> {
    match field.value {
        Value::Rational(ref values) => values
            .first()
            .filter(|r| r.denom != 0)
            .map(|r| r.to_f64()),
        _ => None,
    }
}

/// Signed decimal degrees from a degrees/minutes/seconds triple.
fn coordinate(dms: Option<&Field>, reference: Option<&Field>, negative: &str) -> Option<f64> {
    let Value::Rational(ref parts) = dms?.value else {
        return None;
    };
    let degrees = dms_to_degrees(
        &parts
            .iter()
            .map(|r| if r.denom == 0 { 0.0 } else { r.to_f64() })
            .collect::<Vec<_>>(),
    )?;
    let flip = reference
        .and_then(ascii)
        .is_some_and(|r| r.eq_ignore_ascii_case(negative));
    Some(if flip { -degrees } else { degrees })
}

fn dms_to_degrees(parts: &[f64]) -> Option<f64> {
    let (&degrees, rest) = parts.split_first()?;
    let minutes = rest.first().copied().unwrap_or(0.0);
    let seconds = rest.get(1).copied().unwrap_or(0.0);
    Some(degrees + minutes / 60.0 + seconds / 3600.0)
}
