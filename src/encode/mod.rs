//! # Frame Encoding
//!
//! The container encoder sits behind [`FrameEncoder`] so the pipeline only ever hands it an
//! ordered list of reduced frames and their durations. [`GifEncoder`] is the shipped
//! implementation.

pub mod gif;

pub use self::gif::GifEncoder;

use crate::error::Result;
use crate::frame::RenderedFrame;

/// Container-level options shared by every frame of one animation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EncodeOptions {
    /// Number of repetitions, 0 loops forever
    pub loop_count: u16,

    /// Frames carry binary alpha instead of being flattened. Every frame's colour model
    /// must agree with this flag.
    pub transparent: bool,
}

/// Turns rendered frames into the bytes of an animated image
pub trait FrameEncoder: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Encode `frames` in order into one animation
    fn encode(&self, frames: &[RenderedFrame], options: &EncodeOptions) -> Result<Vec<u8>>;

    /// Encoded size of `frames` without keeping the bytes around.
    ///
    /// Summing estimates of consecutive chunks may differ slightly from the size of the
    /// whole animation because container headers are counted per call.
    fn estimate_size(&self, frames: &[RenderedFrame]) -> Result<u64>;
}
