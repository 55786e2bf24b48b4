use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, info};

use crate::error::{Result, StorageError};
use crate::store::{ensure_safe_ref, FrameStore};

const UPLOADS_DIR: &str = "uploads";
const SESSION_DIRS: [&str; 3] = [UPLOADS_DIR, "projects", "output"];

/// A session directory on disk
///
/// ```text
/// <root>/<session>/uploads/   uploaded source images
/// <root>/<session>/projects/  saved project files
/// <root>/<session>/output/    finished animations
/// ```
///
/// Usage is the size of every file under the session directory plus any output sizes
/// reported but not written there.
pub struct DirectoryStore {
    session_dir: PathBuf,
    reported_bytes: AtomicU64,
}

impl DirectoryStore {
    /// Open the session `session_id` under `root`. The directory does not have to exist yet.
    pub fn new<P: AsRef<Path>>(root: P, session_id: &str) -> Result<Self> {
        ensure_safe_ref(session_id)?;
        Ok(Self {
            session_dir: root.as_ref().join(session_id),
            reported_bytes: AtomicU64::new(0),
        })
    }

    /// Create the session's directory layout
    pub fn initialize(&self) -> Result<()> {
        for dir in SESSION_DIRS {
            fs::create_dir_all(self.session_dir.join(dir))?;
        }
        info!("Initialized session storage at {:?}", self.session_dir);
        Ok(())
    }

    pub fn session_dir(&self) -> &Path {
        &self.session_dir
    }

    pub fn uploads_dir(&self) -> PathBuf {
        self.session_dir.join(UPLOADS_DIR)
    }

    /// Store an uploaded image. Quota checks are the caller's job.
    pub fn save_upload(&self, image_ref: &str, bytes: &[u8]) -> Result<()> {
        ensure_safe_ref(image_ref)?;
        let uploads = self.uploads_dir();
        fs::create_dir_all(&uploads)?;
        fs::write(uploads.join(image_ref), bytes)?;
        debug!("Saved upload {} ({} bytes)", image_ref, bytes.len());
        Ok(())
    }

    fn directory_size(dir: &Path) -> Result<u64> {
        let mut total = 0;
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let file_type = entry.file_type()?;
            if file_type.is_dir() {
                total += Self::directory_size(&entry.path())?;
            } else if file_type.is_file() {
                total += entry.metadata()?.len();
            }
        }
        Ok(total)
    }
}

impl FrameStore for DirectoryStore {
    fn read_image(&self, image_ref: &str) -> Result<Vec<u8>> {
        ensure_safe_ref(image_ref)?;
        let path = self.uploads_dir().join(image_ref);

        fs::read(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => StorageError::NotFound { image_ref: image_ref.to_string() }.into(),
            _ => StorageError::ReadFailed {
                image_ref: image_ref.to_string(),
                reason: e.to_string(),
            }.into(),
        })
    }

    fn storage_used(&self) -> Result<u64> {
        let on_disk = if self.session_dir.is_dir() {
            Self::directory_size(&self.session_dir)?
        } else {
            0
        };
        Ok(on_disk + self.reported_bytes.load(Ordering::Relaxed))
    }

    fn report_output_size(&self, bytes: u64) -> Result<()> {
        self.reported_bytes.fetch_add(bytes, Ordering::Relaxed);
        Ok(())
    }
}
