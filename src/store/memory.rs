use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use crate::error::{ForgeError, Result, StorageError};
use crate::store::{ensure_safe_ref, FrameStore};

/// Images held in memory, keyed by reference
#[derive(Debug, Default)]
pub struct MemoryStore {
    images: RwLock<HashMap<String, Vec<u8>>>,
    base_usage: AtomicU64,
    reported_bytes: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert. The store is owned here, so no lock is taken.
    pub fn with_image<S: Into<String>>(mut self, image_ref: S, bytes: Vec<u8>) -> Self {
        let images = match self.images.get_mut() {
            Ok(images) => images,
            Err(poisoned) => poisoned.into_inner(),
        };
        images.insert(image_ref.into(), bytes);
        self
    }

    pub fn insert<S: Into<String>>(&self, image_ref: S, bytes: Vec<u8>) -> Result<()> {
        let mut images = self.images.write().map_err(|_| Self::poisoned())?;
        images.insert(image_ref.into(), bytes);
        Ok(())
    }

    /// Pretend the session already holds `bytes` besides the stored images
    pub fn set_base_usage(&self, bytes: u64) {
        self.base_usage.store(bytes, Ordering::Relaxed);
    }

    /// Total of all output sizes reported so far
    pub fn reported_bytes(&self) -> u64 {
        self.reported_bytes.load(Ordering::Relaxed)
    }

    fn poisoned() -> ForgeError {
        ForgeError::generic("memory store lock poisoned")
    }
}

impl FrameStore for MemoryStore {
    fn read_image(&self, image_ref: &str) -> Result<Vec<u8>> {
        ensure_safe_ref(image_ref)?;
        let images = self.images.read().map_err(|_| Self::poisoned())?;
        images
            .get(image_ref)
            .cloned()
            .ok_or_else(|| StorageError::NotFound { image_ref: image_ref.to_string() }.into())
    }

    fn storage_used(&self) -> Result<u64> {
        let images = self.images.read().map_err(|_| Self::poisoned())?;
        let stored: u64 = images.values().map(|b| b.len() as u64).sum();
        Ok(stored + self.base_usage.load(Ordering::Relaxed) + self.reported_bytes())
    }

    fn report_output_size(&self, bytes: u64) -> Result<()> {
        self.reported_bytes.fetch_add(bytes, Ordering::Relaxed);
        Ok(())
    }
}
