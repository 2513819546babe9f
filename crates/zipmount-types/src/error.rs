//! Error vocabulary shared by all backends.

use crate::EntryKind;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors reported by backends and the facade.
#[derive(Debug, Error)]
pub enum FsError {
    /// The path is absent from the namespace that owns it.
    #[error("not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The path exists but is the wrong kind for the operation.
    #[error("invalid target: {} is a {found}, expected a {expected}", path.display())]
    InvalidTarget {
        path: PathBuf,
        expected: EntryKind,
        found: EntryKind,
    },

    /// The archive could not be indexed. Fatal for construction.
    #[error("malformed archive: {0}")]
    MalformedArchive(String),

    /// Write attempted on an archive-backed path.
    #[error("read-only: {}", .0.display())]
    ReadOnly(PathBuf),

    /// Any other I/O failure, with its source kept intact.
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl FsError {
    /// Wrap an I/O error, folding `NotFound` into [`FsError::NotFound`] so
    /// callers can match on it regardless of which backend produced it.
    pub fn from_io(path: impl AsRef<Path>, source: io::Error) -> Self {
        let path = path.as_ref().to_path_buf();
        if source.kind() == io::ErrorKind::NotFound {
            FsError::NotFound(path)
        } else {
            FsError::Io { path, source }
        }
    }

    /// The canonical kind of this error.
    pub fn kind(&self) -> FsErrorKind {
        match self {
            FsError::NotFound(_) => FsErrorKind::NotFound,
            FsError::InvalidTarget { .. } => FsErrorKind::InvalidTarget,
            FsError::MalformedArchive(_) => FsErrorKind::MalformedArchive,
            FsError::ReadOnly(_) => FsErrorKind::ReadOnly,
            FsError::Io { .. } => FsErrorKind::Io,
        }
    }
}

/// Canonical classification of an [`FsError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FsErrorKind {
    NotFound,
    InvalidTarget,
    MalformedArchive,
    ReadOnly,
    Io,
}

impl fmt::Display for FsErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FsErrorKind::NotFound => "not found",
            FsErrorKind::InvalidTarget => "invalid target",
            FsErrorKind::MalformedArchive => "malformed archive",
            FsErrorKind::ReadOnly => "read-only",
            FsErrorKind::Io => "i/o error",
        };
        f.write_str(name)
    }
}

/// A facade failure: the canonical kind to match on, plus the original
/// backend error for logging the root cause.
#[derive(Debug, Error)]
#[error("{original}")]
pub struct FsFailure {
    pub canonical: FsErrorKind,
    pub original: FsError,
}

impl From<FsError> for FsFailure {
    fn from(original: FsError) -> Self {
        Self {
            canonical: original.kind(),
            original,
        }
    }
}
