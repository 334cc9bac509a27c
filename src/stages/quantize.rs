//! Color quantization stage.
//!
//! Reduces the bitmap to at most `color_count` colors with Floyd-Steinberg
//! error diffusion. Alpha never takes part: it is captured before
//! quantization and written back afterwards, bit for bit.

use std::sync::Arc;

use quantize_dither::{Palette, PaletteBuilder, Quantizer};

use crate::models::{Bitmap, MAX_COLORS, MIN_COLORS};
use crate::services::cache::{ContentHash, PaletteStore};
use crate::services::progress::{steps, ProgressReporter};

/// The alpha plane of a bitmap, one byte per pixel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransparencyMap(Vec<u8>);

impl TransparencyMap {
    pub fn capture(bitmap: &Bitmap) -> Self {
        Self(bitmap.alpha_channel())
    }

    /// Overwrite every pixel's alpha with the captured value.
    ///
    /// The bitmap must have the same pixel count as the one captured from.
    pub fn restore(&self, bitmap: &mut Bitmap) {
        let image = bitmap.as_rgba_image_mut();
        for (px, &a) in image.pixels_mut().zip(&self.0) {
            px.0[3] = a;
        }
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    /// True when every pixel is fully opaque.
    pub fn is_opaque(&self) -> bool {
        self.0.iter().all(|&a| a == u8::MAX)
    }
}

/// Result of the quantization stage.
#[derive(Debug)]
pub enum QuantizeOutcome {
    Quantized {
        bitmap: Bitmap,
        palette: Arc<Palette>,
        /// The palette came from the store instead of being built
        palette_reused: bool,
    },
    /// Quantization was skipped; `bitmap` is the input, unchanged
    Failed { bitmap: Bitmap, reason: String },
}

impl QuantizeOutcome {
    pub fn bitmap(&self) -> &Bitmap {
        match self {
            QuantizeOutcome::Quantized { bitmap, .. } | QuantizeOutcome::Failed { bitmap, .. } => {
                bitmap
            }
        }
    }

    pub fn into_bitmap(self) -> Bitmap {
        match self {
            QuantizeOutcome::Quantized { bitmap, .. } | QuantizeOutcome::Failed { bitmap, .. } => {
                bitmap
            }
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, QuantizeOutcome::Failed { .. })
    }

    /// Palette colors as RGB bytes, in palette order. `None` when skipped.
    pub fn palette_colors(&self) -> Option<Vec<[u8; 3]>> {
        match self {
            QuantizeOutcome::Quantized { palette, .. } => {
                Some((0..palette.len()).map(|i| palette.bytes(i)).collect())
            }
            QuantizeOutcome::Failed { .. } => None,
        }
    }
}

/// Quantize `bitmap` to at most `color_count` colors.
///
/// `color_count` is clamped into `MIN_COLORS..=MAX_COLORS` before anything
/// else, so out-of-range requests share palettes with the nearest valid
/// count. The palette is looked up in `store` under `"{hash}-{count}"` and
/// built with `builder` only on a miss. Palette resolution is reported as
/// its own step: [`steps::PALETTE_CACHED`] on a hit, [`steps::PALETTE`] on a
/// build.
///
/// Never fails: on any error the input bitmap is returned unchanged inside
/// [`QuantizeOutcome::Failed`].
pub fn quantize(
    bitmap: Bitmap,
    color_count: u8,
    store: &mut PaletteStore,
    hash: &ContentHash,
    builder: &dyn PaletteBuilder,
    quantizer: &Quantizer,
    progress: &dyn ProgressReporter,
) -> QuantizeOutcome {
    let color_count = color_count.clamp(MIN_COLORS, MAX_COLORS);

    if bitmap.is_empty() {
        return failed(bitmap, "bitmap has no pixels".to_string());
    }

    let alpha = TransparencyMap::capture(&bitmap);
    let key = PaletteStore::key(hash, color_count);

    let (palette, palette_reused) = match store.get(&key) {
        Some(palette) => {
            progress.report(steps::PALETTE_CACHED, 0);
            progress.report(steps::PALETTE_CACHED, 100);
            (palette, true)
        }
        None => {
            progress.report(steps::PALETTE, 0);
            let palette = match builder.build(bitmap.as_raw(), color_count as usize) {
                Ok(palette) => store.insert(key.clone(), palette),
                Err(e) => return failed(bitmap, format!("palette construction failed: {e}")),
            };
            progress.report(steps::PALETTE, 100);
            (palette, false)
        }
    };
    tracing::debug!(key = %key, palette_reused, colors = palette.len(), "Resolved palette");

    let (width, height) = (bitmap.width(), bitmap.height());
    let quantized =
        match quantizer.quantize_rgba(bitmap.as_raw(), width as usize, height as usize, &palette) {
            Ok(q) => q,
            Err(e) => return failed(bitmap, e.to_string()),
        };

    let mut out = match Bitmap::from_raw(width, height, quantized.to_rgba(&[])) {
        Ok(out) => out,
        Err(e) => return failed(bitmap, e.to_string()),
    };
    alpha.restore(&mut out);

    QuantizeOutcome::Quantized {
        bitmap: out,
        palette,
        palette_reused,
    }
}

fn failed(bitmap: Bitmap, reason: String) -> QuantizeOutcome {
    tracing::warn!(%reason, "Quantization failed, keeping bitmap unchanged");
    QuantizeOutcome::Failed { bitmap, reason }
}
