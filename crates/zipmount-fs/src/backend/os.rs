//! Real filesystem backend.
//!
//! Plain pass-through to the host filesystem. Paths are used as given: no
//! sandboxing, no root. `stat` follows symlinks.

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use zipmount_types::{EntryKind, FsError, Metadata};

use super::traits::{Backend, FileReader};

/// Real filesystem backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsFs;

impl OsFs {
    /// Create a new real filesystem backend.
    pub fn new() -> Self {
        Self
    }

    /// Create a directory and all missing parents.
    pub fn create_dir_all(&self, path: &Path) -> Result<(), FsError> {
        fs::create_dir_all(path).map_err(|e| FsError::from_io(path, e))
    }

    /// Write `data` to a file, replacing its contents.
    pub fn write_file(&self, path: &Path, data: &[u8]) -> Result<(), FsError> {
        fs::write(path, data).map_err(|e| FsError::from_io(path, e))
    }

    /// Extract the unix mode from std metadata.
    #[cfg(unix)]
    fn extract_mode(meta: &fs::Metadata) -> u32 {
        use std::os::unix::fs::MetadataExt;
        meta.mode()
    }

    #[cfg(not(unix))]
    fn extract_mode(meta: &fs::Metadata) -> u32 {
        if meta.is_dir() {
            0o040755
        } else if meta.permissions().readonly() {
            0o100444
        } else {
            0o100644
        }
    }
}

/// Convert std metadata into a stat descriptor.
fn metadata_from_std(meta: &fs::Metadata) -> Metadata {
    let kind = if meta.is_dir() {
        EntryKind::Directory
    } else if meta.file_type().is_symlink() {
        EntryKind::Symlink
    } else {
        // Sockets, pipes and devices are reported as files.
        EntryKind::File
    };
    let (mtime_sec, mtime_nsec) = meta.modified().map(split_time).unwrap_or((0, 0));
    Metadata {
        kind,
        size: if kind == EntryKind::Directory { 0 } else { meta.len() },
        mode: OsFs::extract_mode(meta),
        mtime_sec,
        mtime_nsec,
    }
}

/// Split a timestamp into unix seconds and a non-negative nanosecond part.
fn split_time(time: SystemTime) -> (i64, u32) {
    match time.duration_since(UNIX_EPOCH) {
        Ok(d) => (d.as_secs() as i64, d.subsec_nanos()),
        Err(e) => {
            let d = e.duration();
            let secs = -(d.as_secs() as i64);
            match d.subsec_nanos() {
                0 => (secs, 0),
                n => (secs - 1, 1_000_000_000 - n),
            }
        }
    }
}

impl Backend for OsFs {
    fn current_dir(&self) -> Result<PathBuf, FsError> {
        std::env::current_dir().map_err(|e| FsError::from_io(".", e))
    }

    fn open(&self, path: &Path) -> Result<FileReader, FsError> {
        let file = File::open(path).map_err(|e| FsError::from_io(path, e))?;
        Ok(Box::new(file))
    }

    fn list_names(&self, path: &Path) -> Result<Vec<String>, FsError> {
        let dir = fs::read_dir(path).map_err(|e| FsError::from_io(path, e))?;
        let mut names = Vec::new();
        for entry in dir {
            let entry = entry.map_err(|e| FsError::from_io(path, e))?;
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        names.sort();
        Ok(names)
    }

    fn stat(&self, path: &Path) -> Result<Metadata, FsError> {
        let meta = fs::metadata(path).map_err(|e| FsError::from_io(path, e))?;
        Ok(metadata_from_std(&meta))
    }
}
