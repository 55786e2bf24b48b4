//! # Frame Buffers
//!
//! Decoding source images into canonical RGBA buffers and reducing composited buffers to the
//! colour model of the output container.

pub mod types;
pub mod normalizer;
pub mod reducer;

pub use types::{CanonicalBuffer, ReducedBuffer, RenderedFrame};
pub use normalizer::{ImageNormalizer, NormalizedImage};
pub use reducer::TransparencyReducer;
