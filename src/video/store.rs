use std::path::{Path, PathBuf};

/// Writes downloaded result videos into a temp directory and hands out
/// releasable handles to them.
pub struct ResultStore {
    dir: PathBuf,
}

impl ResultStore {
    pub fn new() -> anyhow::Result<Self> {
        Self::in_dir(std::env::temp_dir().join("vr180-converter").join("results"))
    }

    pub fn in_dir(dir: PathBuf) -> anyhow::Result<Self> {
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Persist `bytes` and return the owning handle for them.
    pub fn store(&self, bytes: &[u8]) -> anyhow::Result<StoredVideo> {
        let path = self.dir.join(format!("{}.mp4", uuid::Uuid::new_v4()));
        std::fs::write(&path, bytes)?;
        log::debug!("Stored {} result bytes at {}", bytes.len(), path.display());
        Ok(StoredVideo {
            path,
            released: false,
        })
    }
}

/// Handle to a generated video on disk. The backing file is deleted
/// exactly once, either through `release` or when the handle is dropped.
#[derive(Debug)]
pub struct StoredVideo {
    path: PathBuf,
    released: bool,
}

impl StoredVideo {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the handle can still be played back or copied.
    pub fn is_available(&self) -> bool {
        !self.released && self.path.exists()
    }

    /// Copy the video to a user-chosen destination.
    pub fn save_copy_to(&self, destination: &Path) -> anyhow::Result<()> {
        std::fs::copy(&self.path, destination)
            .map_err(|e| anyhow::anyhow!("Failed to save video to {}: {}", destination.display(), e))?;
        Ok(())
    }

    /// Delete the backing file. Returns whether this call actually
    /// performed the release; further calls are no-ops.
    pub fn release(&mut self) -> bool {
        if self.released {
            return false;
        }
        self.released = true;
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                log::warn!("Failed to remove result video {}: {}", self.path.display(), e);
            }
        } else {
            log::debug!("Released result video {}", self.path.display());
        }
        true
    }
}

impl Drop for StoredVideo {
    fn drop(&mut self) {
        self.release();
    }
}
