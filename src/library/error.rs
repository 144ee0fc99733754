use std::path::PathBuf;

use thiserror::Error;

/// Failures of a library query.
#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("music directory not found: {0}")]
    NotFound(PathBuf),
    #[error("permission denied reading {0}")]
    PermissionDenied(PathBuf),
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl LibraryError {
    /// Map an I/O error on `path` onto the library taxonomy.
    pub fn from_io(path: PathBuf, err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(path),
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(path),
            _ => Self::Io { path, source: err },
        }
    }

    /// Whether the error means access to the library was refused.
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, Self::PermissionDenied(_))
    }
}
