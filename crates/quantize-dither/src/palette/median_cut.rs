//! Palette construction from image content.
//!
//! [`MedianCut`] is the default [`PaletteBuilder`]: it recursively splits the
//! image's color histogram along its widest channel until the requested
//! number of boxes exists, then uses each box's population-weighted mean as a
//! palette entry.

use std::collections::{HashMap, HashSet};

use super::error::PaletteError;
use super::palette::{Palette, MAX_PALETTE_SIZE};
use crate::color::Srgb;

/// Derives a representative palette from an RGBA8 pixel buffer.
///
/// Implementations must ignore the alpha channel and must be deterministic:
/// the same pixels and `max_colors` always yield the same palette.
pub trait PaletteBuilder: Send + Sync {
    /// Build a palette with at most `max_colors` entries.
    ///
    /// # Errors
    ///
    /// - [`PaletteError::EmptyPalette`] if the buffer holds no pixels
    /// - [`PaletteError::MisalignedBuffer`] if its length is not a multiple of 4
    fn build(&self, rgba: &[u8], max_colors: usize) -> Result<Palette, PaletteError>;
}

/// Median-cut palette builder.
#[derive(Debug, Clone, Copy, Default)]
pub struct MedianCut;

impl MedianCut {
    /// Create a new median-cut builder.
    pub fn new() -> Self {
        Self
    }
}

/// A histogram bucket: one distinct color and how many pixels use it.
type Bucket = ([u8; 3], u64);

struct ColorBox {
    buckets: Vec<Bucket>,
}

impl ColorBox {
    /// Returns `(channel, range)` for the channel with the widest spread.
    fn widest_channel(&self) -> (usize, u8) {
        let mut best = (0, 0);
        for ch in 0..3 {
            let (min, max) = self
                .buckets
                .iter()
                .fold((u8::MAX, u8::MIN), |(lo, hi), (c, _)| {
                    (lo.min(c[ch]), hi.max(c[ch]))
                });
            let range = max.saturating_sub(min);
            if range > best.1 {
                best = (ch, range);
            }
        }
        best
    }

    fn population(&self) -> u64 {
        self.buckets.iter().map(|(_, n)| n).sum()
    }

    /// Split at the population-weighted median of `channel`.
    ///
    /// Both halves are guaranteed non-empty; callers only split boxes with at
    /// least two distinct colors.
    fn split(mut self, channel: usize) -> (ColorBox, ColorBox) {
        self.buckets.sort_by_key(|(c, _)| c[channel]);

        let half = self.population() / 2;
        let mut acc = 0;
        let mut cut = 1;
        for (i, (_, n)) in self.buckets.iter().enumerate() {
            acc += n;
            if acc >= half {
                cut = i + 1;
                break;
            }
        }
        let cut = cut.clamp(1, self.buckets.len() - 1);

        let upper = self.buckets.split_off(cut);
        (self, ColorBox { buckets: upper })
    }

    fn mean(&self) -> [u8; 3] {
        let total = self.population().max(1);
        let mut sums = [0u64; 3];
        for (c, n) in &self.buckets {
            for ch in 0..3 {
                sums[ch] += c[ch] as u64 * n;
            }
        }
        sums.map(|s| ((s + total / 2) / total) as u8)
    }
}

fn histogram(rgba: &[u8]) -> Result<Vec<Bucket>, PaletteError> {
    if rgba.len() % 4 != 0 {
        return Err(PaletteError::MisalignedBuffer { len: rgba.len() });
    }
    if rgba.is_empty() {
        return Err(PaletteError::EmptyPalette);
    }

    let mut counts: HashMap<[u8; 3], u64> = HashMap::new();
    for px in rgba.chunks_exact(4) {
        *counts.entry([px[0], px[1], px[2]]).or_insert(0) += 1;
    }

    // HashMap order is random; sort so the result is reproducible
    let mut buckets: Vec<Bucket> = counts.into_iter().collect();
    buckets.sort_unstable_by_key(|(c, _)| *c);
    Ok(buckets)
}

impl PaletteBuilder for MedianCut {
    fn build(&self, rgba: &[u8], max_colors: usize) -> Result<Palette, PaletteError> {
        let buckets = histogram(rgba)?;
        let max_colors = max_colors.clamp(1, MAX_PALETTE_SIZE);

        if buckets.len() <= max_colors {
            let colors: Vec<Srgb> = buckets.iter().map(|(c, _)| Srgb::from_bytes(*c)).collect();
            return Palette::new(&colors);
        }

        let mut boxes = vec![ColorBox { buckets }];
        while boxes.len() < max_colors {
            // Pick the splittable box with the widest population-weighted range
            let candidate = boxes
                .iter()
                .enumerate()
                .filter(|(_, b)| b.buckets.len() > 1)
                .map(|(i, b)| {
                    let (ch, range) = b.widest_channel();
                    (i, ch, range as u64 * b.population())
                })
                .max_by_key(|&(i, _, score)| (score, std::cmp::Reverse(i)));

            let Some((idx, channel, _)) = candidate else {
                break;
            };
            let (lo, hi) = boxes.swap_remove(idx).split(channel);
            boxes.push(lo);
            boxes.push(hi);
        }

        let mut colors = Vec::with_capacity(boxes.len());
        let mut seen = HashSet::new();
        for b in &boxes {
            let mean = b.mean();
            if seen.insert(mean) {
                colors.push(Srgb::from_bytes(mean));
            }
        }

        Palette::new(&colors)
    }
}
