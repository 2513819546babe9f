//! Higher-level filesystem facade.
//!
//! Wraps any [`Backend`] with a working directory captured at construction
//! and offers the operations a module resolver needs: directory snapshots
//! with lazy classification, whole-file reads, modification fingerprints and
//! lexical path helpers.

use std::collections::BTreeMap;
use std::io::{self, Read};
use std::path::{Component, MAIN_SEPARATOR_STR, Path, PathBuf};
use std::sync::Arc;

use zipmount_types::{EntryKind, FsError, FsFailure, ModKey};

use crate::backend::{Backend, FileReader};
use crate::paths::clean_path;

/// One child of a listed directory.
///
/// Listing never stats children. An entry starts `Unclassified`; calling
/// [`Entry::classify`] performs the stat and returns a new `Classified`
/// value, leaving the snapshot it came from untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    Unclassified {
        dir: PathBuf,
        base: String,
    },
    Classified {
        dir: PathBuf,
        base: String,
        /// `None` when the stat failed.
        kind: Option<EntryKind>,
    },
}

impl Entry {
    /// Directory holding this entry.
    pub fn dir(&self) -> &Path {
        match self {
            Entry::Unclassified { dir, .. } | Entry::Classified { dir, .. } => dir,
        }
    }

    /// Base name with its original case.
    pub fn base(&self) -> &str {
        match self {
            Entry::Unclassified { base, .. } | Entry::Classified { base, .. } => base,
        }
    }

    /// True until [`Entry::classify`] has been applied.
    pub fn needs_stat(&self) -> bool {
        matches!(self, Entry::Unclassified { .. })
    }

    /// Kind, if classified and the stat succeeded.
    pub fn kind(&self) -> Option<EntryKind> {
        match self {
            Entry::Unclassified { .. } => None,
            Entry::Classified { kind, .. } => *kind,
        }
    }

    /// Stat this entry through `fs` and return its classified form.
    pub fn classify(&self, fs: &FsFacade) -> Entry {
        match self {
            Entry::Classified { .. } => self.clone(),
            Entry::Unclassified { dir, base } => Entry::Classified {
                kind: fs.kind(dir, base),
                dir: dir.clone(),
                base: base.clone(),
            },
        }
    }
}

/// Snapshot of one directory listing.
///
/// Keys are lower-cased base names: children that differ only by case
/// collapse into one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntries {
    dir: PathBuf,
    entries: BTreeMap<String, Entry>,
}

impl DirEntries {
    /// Absolute path of the listed directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Case-insensitive lookup.
    pub fn get(&self, name: &str) -> Option<&Entry> {
        self.entries.get(&name.to_lowercase())
    }

    /// Case-folded keys, sorted.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Entry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Change-notification data. Never populated: watching is not supported.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WatchData {
    paths: Vec<PathBuf>,
}

impl WatchData {
    /// Paths being watched.
    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

/// Filesystem facade over a [`Backend`].
#[derive(Clone)]
pub struct FsFacade {
    cwd: PathBuf,
    inner: Arc<dyn Backend>,
}

impl std::fmt::Debug for FsFacade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FsFacade").field("cwd", &self.cwd).finish()
    }
}

impl FsFacade {
    /// Wrap `inner`, capturing its working directory once.
    pub fn new(inner: Arc<dyn Backend>) -> Result<Self, FsError> {
        let cwd = inner.current_dir()?;
        Ok(Self { cwd, inner })
    }

    /// The working directory captured at construction.
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// The wrapped backend.
    pub fn backend(&self) -> &Arc<dyn Backend> {
        &self.inner
    }

    /// Resolve `path` against the captured working directory.
    ///
    /// Absolute paths come back unchanged.
    pub fn to_absolute(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            clean_path(&self.cwd.join(path))
        }
    }

    /// List `dir` into a snapshot of unclassified entries.
    pub fn read_directory(&self, dir: impl AsRef<Path>) -> Result<DirEntries, FsFailure> {
        let dir = self.to_absolute(dir);
        let names = self.inner.list_names(&dir)?;

        let entries = names
            .into_iter()
            .map(|base| {
                let entry = Entry::Unclassified {
                    dir: dir.clone(),
                    base: base.clone(),
                };
                (base.to_lowercase(), entry)
            })
            .collect();

        Ok(DirEntries { dir, entries })
    }

    /// Read a whole file as UTF-8 text.
    pub fn read_file(&self, path: impl AsRef<Path>) -> Result<String, FsFailure> {
        let path = self.to_absolute(path);
        let mut reader = self.inner.open(&path)?;

        let mut buf = Vec::new();
        reader
            .read_to_end(&mut buf)
            .map_err(|e| FsError::from_io(&path, e))?;

        String::from_utf8(buf).map_err(|e| {
            FsFailure::from(FsError::Io {
                path,
                source: io::Error::new(io::ErrorKind::InvalidData, e),
            })
        })
    }

    /// Fingerprint of `path` for cache invalidation.
    pub fn mod_key(&self, path: impl AsRef<Path>) -> Result<ModKey, FsError> {
        let path = self.to_absolute(path);
        let meta = self.inner.stat(&path)?;
        Ok(ModKey::from(&meta))
    }

    /// Classify `base` inside `dir`. `None` when the stat fails.
    pub fn kind(&self, dir: impl AsRef<Path>, base: &str) -> Option<EntryKind> {
        let path = self.to_absolute(dir).join(base);
        self.inner.stat(&path).ok().map(|meta| meta.kind)
    }

    /// Streamed open is not supported; calling it is a programming error.
    pub fn open_file(&self, path: impl AsRef<Path>) -> Result<FileReader, FsFailure> {
        unimplemented!(
            "open_file({}): streamed open is not supported by FsFacade",
            path.as_ref().display()
        )
    }

    /// Change notifications are never delivered.
    pub fn watch_data(&self) -> WatchData {
        WatchData::default()
    }

    pub fn is_absolute(&self, path: impl AsRef<Path>) -> bool {
        path.as_ref().is_absolute()
    }

    /// Cleaned absolute form of `path`.
    pub fn absolute(&self, path: impl AsRef<Path>) -> PathBuf {
        clean_path(&self.to_absolute(path))
    }

    /// Everything but the last element, cleaned. `.` when nothing remains.
    pub fn dir(&self, path: impl AsRef<Path>) -> PathBuf {
        let cleaned = clean_path(path.as_ref());
        match cleaned.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            Some(_) => PathBuf::from("."),
            None => cleaned,
        }
    }

    /// Last element of `path`; `.` for an empty path, the separator for the root.
    pub fn base(&self, path: impl AsRef<Path>) -> String {
        match path.as_ref().components().next_back() {
            None => ".".to_string(),
            Some(Component::RootDir) => MAIN_SEPARATOR_STR.to_string(),
            Some(c) => c.as_os_str().to_string_lossy().into_owned(),
        }
    }

    /// Suffix of the base name starting at its final `.`, or `""`.
    pub fn ext(&self, path: impl AsRef<Path>) -> String {
        let base = self.base(path);
        match base.rfind('.') {
            Some(i) => base[i..].to_string(),
            None => String::new(),
        }
    }

    /// Join the non-empty parts and clean the result. Empty when all parts are.
    pub fn join<P: AsRef<Path>>(&self, parts: impl IntoIterator<Item = P>) -> PathBuf {
        let mut joined = String::new();
        for part in parts {
            let part = part.as_ref().to_string_lossy();
            if part.is_empty() {
                continue;
            }
            if !joined.is_empty() {
                joined.push_str(MAIN_SEPARATOR_STR);
            }
            joined.push_str(&part);
        }
        if joined.is_empty() {
            return PathBuf::new();
        }
        clean_path(Path::new(&joined))
    }

    /// Lexical path from `base` to `target`, if one exists.
    pub fn rel(&self, base: impl AsRef<Path>, target: impl AsRef<Path>) -> Option<PathBuf> {
        let base = clean_path(base.as_ref());
        let target = clean_path(target.as_ref());
        if base.has_root() != target.has_root() {
            return None;
        }

        let b: Vec<Component> = base.components().filter(|c| *c != Component::CurDir).collect();
        let t: Vec<Component> = target.components().filter(|c| *c != Component::CurDir).collect();
        let common = b.iter().zip(&t).take_while(|(x, y)| x == y).count();
        if b[common..].contains(&Component::ParentDir) {
            return None;
        }

        let mut out = PathBuf::new();
        for _ in common..b.len() {
            out.push("..");
        }
        for c in &t[common..] {
            out.push(c.as_os_str());
        }
        if out.as_os_str().is_empty() {
            out.push(".");
        }
        Some(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::OsFs;
    use rstest::{fixture, rstest};

    /// Facade over the real filesystem, no I/O needed for path helpers.
    #[fixture]
    fn fs() -> FsFacade {
        FsFacade::new(Arc::new(OsFs::new())).unwrap()
    }

    #[rstest]
    #[case("/a/b/c.js", "/a/b")]
    #[case("a/b", "a")]
    #[case("a", ".")]
    #[case("", ".")]
    #[case("/", "/")]
    #[case("/a", "/")]
    #[case("a/b/../c/d.js", "a/c")]
    fn dir_cases(fs: FsFacade, #[case] input: &str, #[case] expected: &str) {
        assert_eq!(fs.dir(input), PathBuf::from(expected));
    }

    #[rstest]
    #[case("/a/b/c.js", "c.js")]
    #[case("a/b/", "b")]
    #[case("", ".")]
    #[case("/", "/")]
    #[case("a/..", "..")]
    fn base_cases(fs: FsFacade, #[case] input: &str, #[case] expected: &str) {
        assert_eq!(fs.base(input), expected);
    }

    #[rstest]
    #[case("index.js", ".js")]
    #[case("/a/b.tar.gz", ".gz")]
    #[case("Makefile", "")]
    #[case(".bashrc", ".bashrc")]
    #[case("/a.d/b", "")]
    fn ext_cases(fs: FsFacade, #[case] input: &str, #[case] expected: &str) {
        assert_eq!(fs.ext(input), expected);
    }

    #[rstest]
    fn join_cases(fs: FsFacade) {
        assert_eq!(fs.join(["a", "b", "c.js"]), PathBuf::from("a/b/c.js"));
        assert_eq!(fs.join(["/a", "", "../b"]), PathBuf::from("/b"));
        assert_eq!(fs.join(["a", "/b"]), PathBuf::from("a/b"));
        assert_eq!(fs.join(["", ""]), PathBuf::new());
    }

    #[rstest]
    #[case("/a/b", "/a/b/c/d", Some("c/d"))]
    #[case("/a/b", "/a/x", Some("../x"))]
    #[case("/a/b", "/a/b", Some("."))]
    #[case("a", "a/b", Some("b"))]
    #[case(".", "a/b", Some("a/b"))]
    #[case("/a", "b", None)]
    #[case("../a", "b", None)]
    fn rel_cases(
        fs: FsFacade,
        #[case] base: &str,
        #[case] target: &str,
        #[case] expected: Option<&str>,
    ) {
        assert_eq!(fs.rel(base, target), expected.map(PathBuf::from));
    }

    #[rstest]
    fn absolute_paths_pass_through(fs: FsFacade) {
        assert!(fs.is_absolute("/x/y"));
        assert!(!fs.is_absolute("x/y"));
        assert_eq!(fs.to_absolute("/x/../y"), PathBuf::from("/x/../y"));
        assert_eq!(fs.absolute("/x/../y"), PathBuf::from("/y"));
        assert_eq!(fs.to_absolute("rel"), fs.cwd().join("rel"));
    }

    #[rstest]
    fn watch_data_is_always_empty(fs: FsFacade) {
        assert!(fs.watch_data().is_empty());
        assert!(fs.watch_data().paths().is_empty());
    }

    #[rstest]
    #[should_panic(expected = "streamed open is not supported")]
    fn open_file_is_fatal(fs: FsFacade) {
        let _ = fs.open_file("/anything");
    }
}
