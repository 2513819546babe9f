//! Archive-backed filesystem.
//!
//! A zip archive is indexed once and mounted at a host path:
//!
//! ```text
//! /proj                       # real filesystem (listing gains "node_modules")
//! └── /proj/node_modules/     # ZipFs mount root, served from the archive index
//!     └── pkg/lib/index.js    # archive member "node_modules/pkg/lib/index.js"
//! ```
//!
//! Paths under the mount root resolve against the index; everything else is
//! delegated to the real filesystem.

mod index;
mod zipfs;

use std::path::Path;

use zip::result::ZipError;
use zipmount_types::FsError;

pub use index::{ArchiveEntry, ArchiveIndex, MemberHandle};
pub use zipfs::{MountOptions, ZipFs};

/// Convert a zip reader error into the shared vocabulary.
pub(crate) fn zip_error(path: &Path, err: ZipError) -> FsError {
    match err {
        ZipError::Io(source) => FsError::from_io(path, source),
        ZipError::FileNotFound => FsError::NotFound(path.to_path_buf()),
        other => FsError::MalformedArchive(format!("{}: {other}", path.display())),
    }
}
