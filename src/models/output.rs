use base64::Engine;
use serde::{Deserialize, Serialize};

/// Encoded output format, selected by configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Jpeg,
    Png,
}

impl OutputFormat {
    pub fn mime_type(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::Png => "image/png",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "jpg",
            OutputFormat::Png => "png",
        }
    }
}

/// The encoded result of one pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessedImage {
    #[serde(skip)]
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub size_bytes: usize,
    pub format: OutputFormat,
    /// True when the bitmap came from the processing cache
    pub from_cache: bool,
    /// Palette the image was quantized with, when dithering ran
    pub palette: Option<Vec<[u8; 3]>>,
    /// Stages that were skipped instead of failing the run
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl ProcessedImage {
    pub fn new(bytes: Vec<u8>, width: u32, height: u32, format: OutputFormat, from_cache: bool) -> Self {
        Self {
            size_bytes: bytes.len(),
            bytes,
            width,
            height,
            format,
            from_cache,
            palette: None,
            warnings: Vec::new(),
        }
    }

    /// Palette entries as `#RRGGBB` strings.
    pub fn palette_hex(&self) -> Vec<String> {
        self.palette
            .iter()
            .flatten()
            .map(|[r, g, b]| format!("#{r:02X}{g:02X}{b:02X}"))
            .collect()
    }

    /// `data:<mime>;base64,...` URL for previews.
    pub fn to_data_url(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.format.mime_type(),
            base64::engine::general_purpose::STANDARD.encode(&self.bytes)
        )
    }

    pub fn stats(&self) -> ImageStats {
        ImageStats {
            size: self.size_bytes,
            width: self.width,
            height: self.height,
        }
    }
}

/// Size and dimensions of an image, for before/after comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageStats {
    pub size: usize,
    pub width: u32,
    pub height: u32,
}

impl ImageStats {
    pub fn resized_from(&self, original: &ImageStats) -> bool {
        self.width != original.width || self.height != original.height
    }
}

/// Size reduction as a percentage string with one decimal, e.g. `"42.5%"`.
///
/// Negative when the output grew. `"0%"` when the original size is zero.
pub fn compression_ratio(original: &ImageStats, compressed: &ImageStats) -> String {
    if original.size == 0 {
        return "0%".to_string();
    }
    let ratio = (original.size as f64 - compressed.size as f64) / original.size as f64 * 100.0;
    format!("{ratio:.1}%")
}

/// Human-readable size in B/KB/MB/GB (base 1024), at most two decimals with
/// trailing zeros trimmed.
pub fn format_file_size(bytes: usize) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 B".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let formatted = format!("{value:.2}");
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    format!("{trimmed} {}", UNITS[unit])
}
