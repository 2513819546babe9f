//! Entry kinds, stat descriptors and modification fingerprints.

use serde::Serialize;
use std::fmt;

/// Kind of filesystem object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Directory,
    Symlink,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntryKind::File => "file",
            EntryKind::Directory => "directory",
            EntryKind::Symlink => "symlink",
        };
        f.write_str(name)
    }
}

/// Stat descriptor returned by every backend.
///
/// `mode` carries the raw unix mode (type bits included) when the source has
/// one. Synthesized directories report zeroed size and time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Metadata {
    /// Kind of object.
    pub kind: EntryKind,
    /// Size in bytes (0 for directories).
    pub size: u64,
    /// Unix mode bits, e.g. `0o100644`.
    pub mode: u32,
    /// Modification time, whole seconds since the unix epoch.
    pub mtime_sec: i64,
    /// Sub-second part of the modification time.
    pub mtime_nsec: u32,
}

impl Metadata {
    /// A synthesized directory with the given mode and no size or time.
    pub fn directory(mode: u32) -> Self {
        Self {
            kind: EntryKind::Directory,
            size: 0,
            mode,
            mtime_sec: 0,
            mtime_nsec: 0,
        }
    }

    /// Returns true if this describes a directory.
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    /// Returns true if this describes a regular file.
    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }

    /// Returns true if this describes a symbolic link.
    pub fn is_symlink(&self) -> bool {
        self.kind == EntryKind::Symlink
    }
}

/// Modification fingerprint of a filesystem object.
///
/// Only meaningful for equality: two keys taken from the same path are equal
/// iff size, mode and both time fields all match. Never display it as a time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct ModKey {
    size: u64,
    mode: u32,
    mtime_sec: i64,
    mtime_nsec: u32,
}

impl From<&Metadata> for ModKey {
    fn from(meta: &Metadata) -> Self {
        Self {
            size: meta.size,
            mode: meta.mode,
            mtime_sec: meta.mtime_sec,
            mtime_nsec: meta.mtime_nsec,
        }
    }
}
