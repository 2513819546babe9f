//! The capability interface every backend implements.

use std::io::Read;
use std::path::{Path, PathBuf};

use zipmount_types::{FsError, Metadata};

/// A readable stream handed out by [`Backend::open`].
///
/// The caller owns it; dropping it releases the underlying handle.
pub type FileReader = Box<dyn Read + Send>;

/// Minimal filesystem interface consumed by [`FsFacade`](crate::FsFacade).
///
/// Paths are host paths. Backends are chosen once, at construction, and
/// the facade never inspects which one it holds.
pub trait Backend: Send + Sync {
    /// The working directory relative paths are resolved against.
    fn current_dir(&self) -> Result<PathBuf, FsError>;

    /// Open a file for streamed, read-only access.
    fn open(&self, path: &Path) -> Result<FileReader, FsError>;

    /// Base names of the immediate children of a directory.
    fn list_names(&self, path: &Path) -> Result<Vec<String>, FsError>;

    /// Describe a file or directory.
    fn stat(&self, path: &Path) -> Result<Metadata, FsError>;
}
