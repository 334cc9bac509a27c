//! Dithering options and configuration.

/// Configuration options for error diffusion dithering.
///
/// # Defaults
///
/// - Serpentine scanning: enabled
/// - Error clamp: 0.5
///
/// # Example
///
/// ```
/// use quantize_dither::DitherOptions;
///
/// let options = DitherOptions::new()
///     .serpentine(false)
///     .error_clamp(0.3);
/// assert!(!options.serpentine);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct DitherOptions {
    /// Enable serpentine scanning (alternating row direction).
    ///
    /// When enabled, odd rows are processed right-to-left and the diffusion
    /// kernel is horizontally flipped. This eliminates directional "worm"
    /// artifacts that appear when processing all rows left-to-right.
    ///
    /// Default: `true`
    pub serpentine: bool,

    /// How far past the displayable range a channel may drift.
    ///
    /// Pixel plus accumulated error is clamped to
    /// `[-error_clamp, 1.0 + error_clamp]` before palette matching.
    ///
    /// Default: `0.5`
    pub error_clamp: f32,
}

impl Default for DitherOptions {
    fn default() -> Self {
        Self {
            serpentine: true,
            error_clamp: 0.5,
        }
    }
}

impl DitherOptions {
    /// Create new dither options with default values.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set serpentine scanning mode.
    #[inline]
    pub fn serpentine(mut self, enabled: bool) -> Self {
        self.serpentine = enabled;
        self
    }

    /// Set error clamping threshold. Negative values are treated as zero.
    #[inline]
    pub fn error_clamp(mut self, clamp: f32) -> Self {
        self.error_clamp = clamp.max(0.0);
        self
    }
}
