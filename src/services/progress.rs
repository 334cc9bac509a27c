//! Progress reporting for pipeline runs.
//!
//! Progress is advisory. Each stage reports 0 when it starts and 100 when it
//! finishes; percentages are per stage, not cumulative.

/// Step labels reported by the pipeline.
pub mod steps {
    pub const COMPRESS: &str = "compress";
    pub const DECODE: &str = "decode";
    pub const ROTATE: &str = "rotate";
    pub const QUANTIZE: &str = "quantize";
    /// Palette built from the bitmap, inside `quantize`
    pub const PALETTE: &str = "palette";
    /// Palette taken from the palette store, inside `quantize`
    pub const PALETTE_CACHED: &str = "palette-cached";
    pub const DETECT_FACES: &str = "detect-faces";
    pub const BLUR: &str = "blur";
    pub const ENCODE: &str = "encode";
}

/// Receives `(step, percent)` progress events.
pub trait ProgressReporter: Send + Sync {
    fn report(&self, step: &str, percent: u8);
}

impl<F> ProgressReporter for F
where
    F: Fn(&str, u8) + Send + Sync,
{
    fn report(&self, step: &str, percent: u8) {
        self(step, percent.min(100))
    }
}

/// Discards all progress events.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn report(&self, _step: &str, _percent: u8) {}
}
