//! File access seam for connection resolution.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, ConfigResult};

/// Read-only view of the file system used by the connection resolver.
pub trait ConfigFs: Send + Sync {
    /// Return the file contents, or `None` when no regular file exists at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error when the file exists but cannot be read.
    fn read_optional(&self, path: &Path) -> ConfigResult<Option<String>>;
}

/// Real file system access.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsFs;

impl ConfigFs for OsFs {
    fn read_optional(&self, path: &Path) -> ConfigResult<Option<String>> {
        if !path.is_file() {
            return Ok(None);
        }
        match fs::read_to_string(path) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(ConfigError::Io {
                operation: "read connection file",
                path: path.to_path_buf(),
                source,
            }),
        }
    }
}

/// In-memory file system keyed by absolute path.
#[derive(Debug, Clone, Default)]
pub struct MemoryFs {
    files: HashMap<PathBuf, String>,
}

impl MemoryFs {
    /// Empty file system.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file, replacing any previous contents.
    #[must_use]
    pub fn with_file(mut self, path: impl Into<PathBuf>, contents: impl Into<String>) -> Self {
        self.files.insert(path.into(), contents.into());
        self
    }
}

impl ConfigFs for MemoryFs {
    fn read_optional(&self, path: &Path) -> ConfigResult<Option<String>> {
        Ok(self.files.get(path).cloned())
    }
}
