//! # gif-forge
//!
//! Assemble still images into animated GIFs with synthetic transition frames in between.
//!
//! Given an ordered list of source frames, each shown for its own duration, and a transition
//! setting, the library resizes every image to one canvas, inserts crossfade, fade or slide
//! frames between neighbours, reduces transparency to what GIF can express and encodes the
//! result, all under per-session resource quotas.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use gif_forge::{
//!     composition::RenderPipeline,
//!     config::Config,
//!     project::Project,
//!     store::DirectoryStore,
//! };
//!
//! # fn main() -> anyhow::Result<()> {
//! let store = Arc::new(DirectoryStore::new("user_data", "session-id")?);
//! let pipeline = RenderPipeline::new(Config::default(), store)?;
//!
//! let project = Project::load("project.json")?;
//! let output = pipeline.generate_full(&project)?;
//! std::fs::write("animation.gif", &output.encoded)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! The library is organized into several key modules:
//!
//! - [`project`] - Projects, source frames and render settings
//! - [`frame`] - Decoding to canonical RGBA buffers and transparency reduction
//! - [`transitions`] - Crossfade, fade-through-colour and slide compositing
//! - [`composition`] - Render planning and the render pipeline
//! - [`quota`] - Resource limits
//! - [`encode`] - Container encoders
//! - [`store`] - Session storage
//! - [`config`] - Configuration management
//!
//! ## Custom Encoders
//!
//! Any container can be plugged in by implementing [`FrameEncoder`](encode::FrameEncoder):
//!
//! ```rust,no_run
//! use gif_forge::encode::{EncodeOptions, FrameEncoder};
//! use gif_forge::frame::RenderedFrame;
//! use gif_forge::Result;
//!
//! struct RawDump;
//!
//! impl FrameEncoder for RawDump {
//!     fn name(&self) -> &str {
//!         "raw"
//!     }
//!
//!     fn encode(&self, frames: &[RenderedFrame], _options: &EncodeOptions) -> Result<Vec<u8>> {
//!         Ok(frames.iter().flat_map(|f| f.buffer.as_raw().to_vec()).collect())
//!     }
//!
//!     fn estimate_size(&self, frames: &[RenderedFrame]) -> Result<u64> {
//!         Ok(frames.iter().map(|f| f.buffer.as_raw().len() as u64).sum())
//!     }
//! }
//! ```

pub mod composition;
pub mod config;
pub mod encode;
pub mod error;
pub mod frame;
pub mod project;
pub mod quota;
pub mod store;
pub mod transitions;

// Re-export commonly used types for convenience
pub use crate::{
    composition::{RenderOutput, RenderPipeline},
    config::Config,
    encode::{FrameEncoder, GifEncoder},
    error::{ForgeError, Result},
    project::Project,
    store::{DirectoryStore, FrameStore, MemoryStore},
};
