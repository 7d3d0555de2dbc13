use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::error::Result;

/// A uniquely named scratch directory owned by one invocation.
///
/// The directory is removed when the value is dropped, on success and on
/// every error path alike. [`ScratchDir::close`] removes it eagerly and
/// reports cleanup failures.
#[derive(Debug)]
pub struct ScratchDir {
    dir: TempDir,
}

impl ScratchDir {
    /// Create a fresh scratch directory in the system temp location.
    pub fn new(label: &str) -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix(&format!("blinder-{label}-"))
            .tempdir()?;
        tracing::debug!(path = %dir.path().display(), "created scratch directory");
        Ok(Self { dir })
    }

    /// Path of the scratch directory.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write `data` to `name` inside the scratch directory.
    pub fn stage(&self, name: &str, data: &[u8]) -> Result<PathBuf> {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, data)?;
        Ok(path)
    }

    /// Move a staged file to its final destination.
    ///
    /// Falls back to copying when the destination lives on another filesystem.
    pub fn persist(&self, staged: &Path, destination: &Path) -> Result<()> {
        if let Some(parent) = destination.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        if fs::rename(staged, destination).is_err() {
            fs::copy(staged, destination)?;
        }
        Ok(())
    }

    /// Remove the directory now.
    pub fn close(self) -> Result<()> {
        self.dir.close()?;
        Ok(())
    }
}
