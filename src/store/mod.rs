//! # Session Storage
//!
//! Rendering reads uploaded images and storage usage through [`FrameStore`], so the
//! pipeline never touches the filesystem directly.
//!
//! - [`DirectoryStore`]: one session directory on disk, `<root>/<session>/uploads/<ref>`
//! - [`MemoryStore`]: images held in memory, for embedding and tests

pub mod directory;
pub mod memory;

pub use directory::DirectoryStore;
pub use memory::MemoryStore;

use std::path::{Component, Path};

use crate::error::{Result, StorageError};

/// Session-scoped access to uploaded images and storage accounting
pub trait FrameStore: Send + Sync {
    /// Raw bytes of the uploaded image named `image_ref`
    ///
    /// # Errors
    ///
    /// `StorageError::NotFound` when no such image exists and `StorageError::UnsafePath`
    /// when the reference would escape the session.
    fn read_image(&self, image_ref: &str) -> Result<Vec<u8>>;

    /// Bytes currently held by the session
    fn storage_used(&self) -> Result<u64>;

    /// Record that a finished render of `bytes` now belongs to the session
    fn report_output_size(&self, bytes: u64) -> Result<()>;
}

/// A reference must be one plain file name: no separators, no `..`, not absolute
pub(crate) fn ensure_safe_ref(image_ref: &str) -> Result<()> {
    let mut components = Path::new(image_ref).components();
    let safe = matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    ) && !image_ref.contains(['/', '\\']);

    if !safe {
        return Err(StorageError::UnsafePath { image_ref: image_ref.to_string() }.into());
    }
    Ok(())
}
