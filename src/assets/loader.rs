//! Content loading.
//!
//! A load either returns every byte of the file or fails; there is no
//! partial read and nothing is retried.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;
use tracing::trace;

/// Why an asset could not be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadErrorKind {
    NotFound,
    PermissionDenied,
    Io,
}

impl fmt::Display for LoadErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LoadErrorKind::NotFound => "file not found",
            LoadErrorKind::PermissionDenied => "permission denied",
            LoadErrorKind::Io => "read failed",
        })
    }
}

#[derive(Debug, Error)]
#[error("{kind}: `{filename}`")]
pub struct LoadError {
    pub filename: String,
    pub kind: LoadErrorKind,
    #[source]
    pub source: io::Error,
}

impl LoadError {
    pub fn new(filename: impl Into<String>, source: io::Error) -> Self {
        let kind = match source.kind() {
            io::ErrorKind::NotFound => LoadErrorKind::NotFound,
            io::ErrorKind::PermissionDenied => LoadErrorKind::PermissionDenied,
            _ => LoadErrorKind::Io,
        };
        Self {
            filename: filename.into(),
            kind,
            source,
        }
    }
}

/// Reads the bytes of an asset named by a call site.
pub trait AssetLoader {
    fn load(&self, filename: &str) -> Result<Vec<u8>, LoadError>;

    /// Where `filename` is looked for, for diagnostics.
    fn locate(&self, _filename: &str) -> Option<PathBuf> {
        None
    }
}

impl<L: AssetLoader + ?Sized> AssetLoader for &L {
    fn load(&self, filename: &str) -> Result<Vec<u8>, LoadError> {
        (**self).load(filename)
    }

    fn locate(&self, filename: &str) -> Option<PathBuf> {
        (**self).locate(filename)
    }
}

// ============================================================================
// FILESYSTEM
// ============================================================================

/// Loads assets from disk. Relative names are resolved against `root`;
/// absolute names are used as they are.
#[derive(Debug, Clone)]
pub struct FsLoader {
    root: PathBuf,
}

impl FsLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn resolve(&self, filename: &str) -> PathBuf {
        self.root.join(filename)
    }
}

impl Default for FsLoader {
    /// Resolves against the working directory.
    fn default() -> Self {
        Self::new("")
    }
}

impl AssetLoader for FsLoader {
    fn load(&self, filename: &str) -> Result<Vec<u8>, LoadError> {
        let path = self.resolve(filename);
        trace!(path = %path.display(), "reading asset");
        std::fs::read(&path).map_err(|e| LoadError::new(filename, e))
    }

    fn locate(&self, filename: &str) -> Option<PathBuf> {
        Some(self.resolve(filename))
    }
}

// ============================================================================
// IN MEMORY
// ============================================================================

/// Serves assets from a map and records every load, in order.
#[derive(Debug, Default)]
pub struct MemoryLoader {
    files: HashMap<String, Vec<u8>>,
    loads: RefCell<Vec<String>>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, filename: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.insert(filename, bytes);
        self
    }

    pub fn insert(&mut self, filename: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.files.insert(filename.into(), bytes.into());
    }

    /// Every filename requested so far, including failed requests.
    pub fn loads(&self) -> Vec<String> {
        self.loads.borrow().clone()
    }
}

impl AssetLoader for MemoryLoader {
    fn load(&self, filename: &str) -> Result<Vec<u8>, LoadError> {
        self.loads.borrow_mut().push(filename.to_string());
        self.files.get(filename).cloned().ok_or_else(|| {
            LoadError::new(
                filename,
                io::Error::new(io::ErrorKind::NotFound, "no such asset"),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fs_loader_reads_relative_to_root() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("templates")).unwrap();
        std::fs::write(dir.path().join("templates/index.html"), b"<h1>").unwrap();

        let loader = FsLoader::new(dir.path());
        assert_eq!(loader.load("templates/index.html").unwrap(), b"<h1>");
    }

    #[test]
    fn test_fs_loader_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = FsLoader::new(dir.path()).load("missing.html").unwrap_err();
        assert_eq!(err.kind, LoadErrorKind::NotFound);
        assert_eq!(err.filename, "missing.html");
    }

    #[test]
    fn test_memory_loader_records_loads() {
        let loader = MemoryLoader::new().with_file("a", vec![1u8]);
        assert!(loader.load("a").is_ok());
        assert!(loader.load("b").is_err());
        assert_eq!(loader.loads(), ["a", "b"]);
    }
}
