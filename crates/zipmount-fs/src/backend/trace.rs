//! Instrumenting backend.
//!
//! Passes every call through to the real filesystem and remembers which
//! directories were listed, which failed to list, and which files were
//! opened. Outcomes are never altered.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use zipmount_types::{FsError, Metadata};

use super::os::OsFs;
use super::traits::{Backend, FileReader};

#[derive(Debug, Default)]
struct Recorded {
    listed: Vec<PathBuf>,
    failed: Vec<PathBuf>,
    opened: Vec<PathBuf>,
}

/// Insert `path` unless already present, keeping first-seen order.
fn record(into: &mut Vec<PathBuf>, path: &Path) {
    if !into.iter().any(|p| p == path) {
        into.push(path.to_path_buf());
    }
}

/// Real filesystem backend that records what it touched.
///
/// The recordings sit behind a mutex, so concurrent callers are memory-safe,
/// but the order of entries from interleaved calls is whatever the threads
/// happened to produce.
#[derive(Debug, Default)]
pub struct TraceFs {
    inner: OsFs,
    recorded: Mutex<Recorded>,
}

impl TraceFs {
    /// Create a tracing backend over the real filesystem.
    pub fn new() -> Self {
        Self::default()
    }

    fn with_recorded<T>(&self, f: impl FnOnce(&mut Recorded) -> T) -> T {
        let mut guard = self.recorded.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    /// Directories listed successfully, in first-seen order.
    pub fn listed_dirs(&self) -> Vec<PathBuf> {
        self.with_recorded(|r| r.listed.clone())
    }

    /// Directories that failed to list, in first-seen order.
    pub fn failed_dirs(&self) -> Vec<PathBuf> {
        self.with_recorded(|r| r.failed.clone())
    }

    /// Files opened successfully, in first-seen order.
    pub fn opened_files(&self) -> Vec<PathBuf> {
        self.with_recorded(|r| r.opened.clone())
    }

    /// Human-readable dump of everything recorded.
    pub fn scan_log(&self) -> String {
        self.with_recorded(|r| {
            if r.listed.is_empty() && r.opened.is_empty() {
                return "-- nothing was opened --".to_string();
            }

            let mut out = String::new();
            for (label, paths) in [("dir", &r.listed), ("try", &r.failed), ("file", &r.opened)] {
                if paths.is_empty() {
                    continue;
                }
                for path in paths {
                    let _ = writeln!(out, "\t{label}: {}", path.display());
                }
                out.push('\n');
            }
            out
        })
    }
}

impl Backend for TraceFs {
    fn current_dir(&self) -> Result<PathBuf, FsError> {
        self.inner.current_dir()
    }

    fn open(&self, path: &Path) -> Result<FileReader, FsError> {
        let reader = self.inner.open(path)?;
        self.with_recorded(|r| record(&mut r.opened, path));
        Ok(reader)
    }

    fn list_names(&self, path: &Path) -> Result<Vec<String>, FsError> {
        match self.inner.list_names(path) {
            Ok(names) => {
                self.with_recorded(|r| record(&mut r.listed, path));
                Ok(names)
            }
            Err(e) => {
                self.with_recorded(|r| record(&mut r.failed, path));
                Err(e)
            }
        }
    }

    fn stat(&self, path: &Path) -> Result<Metadata, FsError> {
        self.inner.stat(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_log() {
        let trace = TraceFs::new();
        assert_eq!(trace.scan_log(), "-- nothing was opened --");
    }

    #[test]
    fn test_records_are_deduplicated_in_order() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("b")).unwrap();
        std::fs::write(dir.path().join("f.txt"), b"x").unwrap();

        let trace = TraceFs::new();
        trace.list_names(&dir.path().join("b")).unwrap();
        trace.list_names(dir.path()).unwrap();
        trace.list_names(&dir.path().join("b")).unwrap();
        trace.open(&dir.path().join("f.txt")).unwrap();
        trace.open(&dir.path().join("f.txt")).unwrap();

        assert_eq!(
            trace.listed_dirs(),
            vec![dir.path().join("b"), dir.path().to_path_buf()]
        );
        assert_eq!(trace.opened_files(), vec![dir.path().join("f.txt")]);
        assert!(trace.failed_dirs().is_empty());
    }

    #[test]
    fn test_failures_recorded_and_propagated() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");

        let trace = TraceFs::new();
        assert!(trace.list_names(&missing).is_err());
        assert!(trace.open(&missing).is_err());

        assert_eq!(trace.failed_dirs(), vec![missing]);
        assert!(trace.opened_files().is_empty());
        // Failed listings alone do not count as "opened".
        assert_eq!(trace.scan_log(), "-- nothing was opened --");
    }

    #[test]
    fn test_scan_log_layout() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("f.txt"), b"x").unwrap();
        let missing = dir.path().join("nope");

        let trace = TraceFs::new();
        trace.list_names(dir.path()).unwrap();
        let _ = trace.list_names(&missing);
        trace.open(&dir.path().join("f.txt")).unwrap();

        let expected = format!(
            "\tdir: {}\n\n\ttry: {}\n\n\tfile: {}\n\n",
            dir.path().display(),
            missing.display(),
            dir.path().join("f.txt").display()
        );
        assert_eq!(trace.scan_log(), expected);
    }
}
