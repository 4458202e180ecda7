//! Filesystem-based configuration store.
//!
//! Document keys are relative paths below a base directory. Keys that would
//! resolve outside of it (`../../etc/passwd`, absolute paths) are refused.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use valuer_traits::{ConfigStore, SharedDocument, StoreError};

/// A configuration store backed by a directory.
#[derive(Debug)]
pub struct FilesystemConfigStore {
    base_path: PathBuf,
    /// Canonicalized base path for security checks
    canonical_base: Option<PathBuf>,
}

impl FilesystemConfigStore {
    /// Creates a store rooted at `base_path`.
    pub fn new<P: AsRef<Path>>(base_path: P) -> Self {
        let base = base_path.as_ref().to_path_buf();
        // May fail if the directory does not exist yet
        let canonical = base.canonicalize().ok();
        Self {
            base_path: base,
            canonical_base: canonical,
        }
    }

    pub fn base(&self) -> &Path {
        &self.base_path
    }

    /// Resolves a key to a path below the base directory.
    ///
    /// Returns `None` if the key would escape the base directory.
    fn resolve_path_safe(&self, key: &str) -> Option<PathBuf> {
        if Path::new(key).is_absolute() {
            return None;
        }
        // Refuse ".." outright; canonicalization cannot help for files that
        // do not exist yet (writes).
        if Path::new(key)
            .components()
            .any(|c| matches!(c, Component::ParentDir | Component::Prefix(_)))
        {
            return None;
        }

        let full_path = self.base_path.join(key);

        if let Ok(canonical) = full_path.canonicalize()
            && let Some(ref base) = self.canonical_base
        {
            return canonical.starts_with(base).then_some(canonical);
        }

        Some(full_path)
    }
}

impl ConfigStore for FilesystemConfigStore {
    fn read_document(&self, key: &str) -> Result<SharedDocument, StoreError> {
        let full_path = self
            .resolve_path_safe(key)
            .ok_or_else(|| StoreError::NotFound(format!("{key} (path traversal blocked)")))?;

        log::debug!("Reading configuration document {}", full_path.display());
        std::fs::read(&full_path).map(Arc::new).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StoreError::NotFound(key.to_string())
            } else {
                StoreError::ReadFailed {
                    key: key.to_string(),
                    message: e.to_string(),
                }
            }
        })
    }

    fn write_document(&self, key: &str, data: Vec<u8>) -> Result<(), StoreError> {
        let full_path = self.resolve_path_safe(key).ok_or_else(|| StoreError::WriteFailed {
            key: key.to_string(),
            message: "path traversal blocked".to_string(),
        })?;
        let write_failed = |e: std::io::Error| StoreError::WriteFailed {
            key: key.to_string(),
            message: e.to_string(),
        };

        if let Some(parent) = full_path.parent() {
            std::fs::create_dir_all(parent).map_err(write_failed)?;
        }
        // Replace the whole document in one step so readers never observe a
        // half-written file.
        let staging = full_path.with_extension("valuer-tmp");
        std::fs::write(&staging, &data).map_err(write_failed)?;
        std::fs::rename(&staging, &full_path).map_err(write_failed)?;
        log::debug!("Wrote configuration document {} ({} bytes)", full_path.display(), data.len());
        Ok(())
    }

    fn exists(&self, key: &str) -> bool {
        self.resolve_path_safe(key)
            .map(|p| p.is_file())
            .unwrap_or(false)
    }

    fn name(&self) -> &'static str {
        "FilesystemConfigStore"
    }
}
