//! Per-target scratch directories.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use uuid::Uuid;

use super::errors::{EngineError, EngineResult};

/// A directory that is removed with everything in it when dropped.
///
/// Holds the copied input and the engine output for one render target, so
/// both go away on every exit path including errors and cancellation.
#[derive(Debug)]
pub struct ScratchSpace {
    root: PathBuf,
}

impl ScratchSpace {
    /// Create a fresh uniquely named directory under `parent`.
    pub fn create(parent: &Path) -> EngineResult<Self> {
        let root = parent.join(format!("autoframe-{}", Uuid::new_v4().simple()));
        fs::create_dir_all(&root).map_err(|e| EngineError::io(&root, e))?;
        debug!("Created scratch space {}", root.display());
        Ok(Self { root })
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    pub fn join(&self, name: impl AsRef<Path>) -> PathBuf {
        self.root.join(name)
    }
}

impl Drop for ScratchSpace {
    fn drop(&mut self) {
        match fs::remove_dir_all(&self.root) {
            Ok(()) => debug!("Removed scratch space {}", self.root.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove scratch space {}: {}", self.root.display(), e),
        }
    }
}
