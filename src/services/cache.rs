//! Processing cache and palette store.
//!
//! [`ProcessingCache`] remembers the options, source and [`Snapshot`] of
//! the last successful run so an unchanged request can skip straight to
//! encoding. It also owns a [`PaletteStore`], an LRU of palettes keyed by
//! sampled content hash and color count, which lets a reprocess skip palette
//! construction for content it has already seen.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use quantize_dither::Palette;
use sha2::{Digest, Sha256};

use crate::models::{Bitmap, ProcessingOptions, SourceId, SourceImage};

/// Number of bytes the content hash samples, at most.
const HASH_SAMPLES: usize = 1000;

/// Fingerprint of a bitmap's pixel data. Cache key material only.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentHash(String);

impl ContentHash {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Compute a sampled content hash of a bitmap.
///
/// SHA256 over the dimensions and every `max(1, len / 1000)`th byte of the
/// RGBA buffer. Two bitmaps that agree on the sampled bytes hash the same;
/// such collisions are accepted.
pub fn content_hash(bitmap: &Bitmap) -> ContentHash {
    let raw = bitmap.as_raw();
    let stride = (raw.len() / HASH_SAMPLES).max(1);

    let mut hasher = Sha256::new();
    hasher.update(bitmap.width().to_le_bytes());
    hasher.update(bitmap.height().to_le_bytes());
    hasher.update(b"|");
    let sampled: Vec<u8> = raw.iter().step_by(stride).copied().collect();
    hasher.update(&sampled);

    let result = hasher.finalize();
    // Use first 16 bytes of hash, encoded as 32 hex characters
    ContentHash(hex::encode(&result[..16]))
}

/// Palettes keyed by `"{content_hash}-{color_count}"`, with LRU eviction.
#[derive(Debug)]
pub struct PaletteStore {
    palettes: HashMap<String, Arc<Palette>>,
    /// Keys from least to most recently used
    insertion_order: Vec<String>,
    max_entries: usize,
}

impl PaletteStore {
    pub fn new(max_entries: usize) -> Self {
        Self {
            palettes: HashMap::new(),
            insertion_order: Vec::new(),
            max_entries: max_entries.max(1),
        }
    }

    /// Cache key for a palette of `color_count` entries built from `hash`.
    pub fn key(hash: &ContentHash, color_count: u8) -> String {
        format!("{hash}-{color_count}")
    }

    /// Look up a palette, marking it most recently used.
    pub fn get(&mut self, key: &str) -> Option<Arc<Palette>> {
        let palette = self.palettes.get(key)?.clone();

        self.insertion_order.retain(|k| k != key);
        self.insertion_order.push(key.to_string());

        Some(palette)
    }

    /// Store a palette, evicting the least recently used entries when full.
    pub fn insert(&mut self, key: String, palette: Palette) -> Arc<Palette> {
        if self.palettes.contains_key(&key) {
            self.insertion_order.retain(|k| k != &key);
        }

        while self.palettes.len() >= self.max_entries && !self.insertion_order.is_empty() {
            let oldest_key = self.insertion_order.remove(0);
            self.palettes.remove(&oldest_key);
            tracing::debug!(
                key = %oldest_key,
                cache_size = self.palettes.len(),
                "Palette store: evicted oldest entry"
            );
        }

        let palette = Arc::new(palette);
        self.palettes.insert(key.clone(), Arc::clone(&palette));
        self.insertion_order.push(key);
        palette
    }

    pub fn contains(&self, key: &str) -> bool {
        self.palettes.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.palettes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.palettes.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.max_entries
    }

    pub fn clear(&mut self) {
        self.palettes.clear();
        self.insertion_order.clear();
    }
}

/// Observable state of a [`ProcessingCache`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    /// Nothing cached; the next run always processes in full
    Empty,
    /// A snapshot for the last options and source is held
    Valid,
}

/// What a successful run leaves behind for the next cache hit.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    /// Bitmap after every stage, before encoding
    pub bitmap: Bitmap,
    /// RGB palette the bitmap was quantized with
    pub palette: Option<Vec<[u8; 3]>>,
    /// Stages that were skipped, with the reason
    pub warnings: Vec<String>,
}

impl From<Bitmap> for Snapshot {
    fn from(bitmap: Bitmap) -> Self {
        Self {
            bitmap,
            palette: None,
            warnings: Vec::new(),
        }
    }
}

#[derive(Debug)]
struct CachedRun {
    options: ProcessingOptions,
    source: SourceId,
    snapshot: Snapshot,
}

/// Result cache for the pipeline, owned by the caller and passed in by
/// reference on every run.
#[derive(Debug)]
pub struct ProcessingCache {
    last: Option<CachedRun>,
    palettes: PaletteStore,
}

impl ProcessingCache {
    pub fn new(palette_capacity: usize) -> Self {
        Self {
            last: None,
            palettes: PaletteStore::new(palette_capacity),
        }
    }

    pub fn state(&self) -> CacheState {
        if self.last.is_some() {
            CacheState::Valid
        } else {
            CacheState::Empty
        }
    }

    /// Whether a run with `options` over `source` must go through the
    /// pipeline again rather than reuse the snapshot.
    pub fn should_reprocess(&self, options: &ProcessingOptions, source: &SourceImage) -> bool {
        match self.reprocess_reason(options, source) {
            Some(reason) => {
                tracing::debug!(reason, "Processing cache miss");
                true
            }
            None => {
                tracing::debug!("Processing cache hit");
                false
            }
        }
    }

    /// The first field that forces a reprocess, if any.
    ///
    /// Fields are compared one by one. `color_count` only matters while
    /// dithering is on.
    pub fn reprocess_reason(
        &self,
        options: &ProcessingOptions,
        source: &SourceImage,
    ) -> Option<&'static str> {
        let Some(last) = &self.last else {
            return Some("no previous run");
        };
        let prev = &last.options;

        if last.source != source.id() {
            Some("source changed")
        } else if prev.max_width != options.max_width {
            Some("max width changed")
        } else if prev.quality != options.quality {
            Some("quality changed")
        } else if prev.apply_dithering != options.apply_dithering {
            Some("dithering toggled")
        } else if options.apply_dithering && prev.color_count != options.color_count {
            Some("color count changed")
        } else if prev.rotation != options.rotation {
            Some("rotation changed")
        } else if prev.apply_blur != options.apply_blur {
            Some("blur toggled")
        } else {
            None
        }
    }

    /// Record a successful run.
    pub fn update(&mut self, options: ProcessingOptions, source: SourceId, snapshot: Snapshot) {
        tracing::debug!(
            source = source.get(),
            width = snapshot.bitmap.width(),
            height = snapshot.bitmap.height(),
            palette = snapshot.palette.as_ref().map(Vec::len),
            "Processing cache updated"
        );
        self.last = Some(CachedRun {
            options,
            source,
            snapshot,
        });
    }

    /// What the last successful run produced, before encoding.
    pub fn snapshot(&self) -> Option<&Snapshot> {
        self.last.as_ref().map(|run| &run.snapshot)
    }

    pub fn last_options(&self) -> Option<&ProcessingOptions> {
        self.last.as_ref().map(|run| &run.options)
    }

    pub fn last_source(&self) -> Option<SourceId> {
        self.last.as_ref().map(|run| run.source)
    }

    pub fn palettes(&self) -> &PaletteStore {
        &self.palettes
    }

    pub fn palettes_mut(&mut self) -> &mut PaletteStore {
        &mut self.palettes
    }

    /// Drop the snapshot, the options and every stored palette.
    pub fn clear(&mut self) {
        self.last = None;
        self.palettes.clear();
        tracing::debug!("Processing cache cleared");
    }
}

impl Default for ProcessingCache {
    fn default() -> Self {
        Self::new(crate::models::PipelineConfig::default().palette_cache_capacity)
    }
}
