//! Zip archive mounted over the real filesystem.

use std::fmt;
use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek};
use std::path::{Component, Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use tracing::{debug, trace};
use zip::ZipArchive;

use zipmount_types::{EntryKind, FsError, Metadata};

use super::index::{ArchiveEntry, ArchiveIndex};
use super::zip_error;
use crate::backend::{Backend, FileReader, OsFs};
use crate::paths;

/// Upper bound on the buffer reserved up front when opening a member.
const MAX_PREALLOC: usize = 1 << 20;

/// Where and how an archive is mounted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountOptions {
    /// Host path at which the archive root appears. Relative paths are
    /// resolved against `cwd`.
    pub mount_root: PathBuf,
    /// Subtree inside the archive exposed at `mount_root` (`""` for all of it).
    pub zip_root: String,
    /// Working directory reported to callers and used for relative paths.
    pub cwd: PathBuf,
}

/// Where a queried path is served from.
enum Route {
    /// Canonical name inside the archive index.
    Archive(String),
    /// Cleaned absolute host path.
    Os(PathBuf),
}

/// Archive-backed filesystem.
///
/// Paths equal to or below the mount root are answered from an index built
/// once at construction; all other paths go to the real filesystem. The
/// parent of the mount root additionally lists the mount point's name, so a
/// directory walk discovers the archive like any other child.
///
/// The index is immutable, so concurrent `stat` and `list_names` calls need
/// no locking. `open` takes a short lock on the shared archive reader while
/// it copies the member out; each call returns an independent stream.
pub struct ZipFs<R = BufReader<File>> {
    cwd: PathBuf,
    mount_root: PathBuf,
    mount_key: String,
    mount_parent: Option<PathBuf>,
    mount_name: Option<String>,
    index: ArchiveIndex,
    archive: Mutex<ZipArchive<R>>,
    os: OsFs,
}

impl<R> fmt::Debug for ZipFs<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ZipFs")
            .field("cwd", &self.cwd)
            .field("mount_root", &self.mount_root)
            .field("entries", &self.index.len())
            .finish()
    }
}

impl ZipFs<BufReader<File>> {
    /// Open the archive at `archive` and mount it.
    pub fn open(archive: impl AsRef<Path>, options: MountOptions) -> Result<Self, FsError> {
        let path = archive.as_ref();
        let file = File::open(path).map_err(|e| FsError::from_io(path, e))?;
        let zip = ZipArchive::new(BufReader::new(file)).map_err(|e| zip_error(path, e))?;
        Self::mount(zip, options)
    }
}

impl<R: Read + Seek> ZipFs<R> {
    /// Mount an archive read from any seekable source.
    pub fn from_reader(reader: R, options: MountOptions) -> Result<Self, FsError> {
        let zip = ZipArchive::new(reader).map_err(|e| zip_error(Path::new("<archive>"), e))?;
        Self::mount(zip, options)
    }

    fn mount(mut zip: ZipArchive<R>, options: MountOptions) -> Result<Self, FsError> {
        let MountOptions {
            mount_root,
            zip_root,
            cwd,
        } = options;

        let mount_root = if mount_root.is_absolute() {
            paths::clean_path(&mount_root)
        } else {
            paths::clean_path(&cwd.join(&mount_root))
        };
        let index = ArchiveIndex::build(&mut zip, &zip_root)?;

        debug!(
            "mounted {} archive entries from {:?} at {}",
            index.len(),
            zip_root,
            mount_root.display()
        );

        Ok(Self {
            mount_key: host_key(&mount_root),
            mount_parent: mount_root.parent().map(Path::to_path_buf),
            mount_name: mount_root
                .file_name()
                .map(|n| n.to_string_lossy().into_owned()),
            mount_root,
            cwd,
            index,
            archive: Mutex::new(zip),
            os: OsFs::new(),
        })
    }
}

impl<R> ZipFs<R> {
    /// The host path the archive root is mounted at.
    pub fn mount_root(&self) -> &Path {
        &self.mount_root
    }

    /// The archive index.
    pub fn index(&self) -> &ArchiveIndex {
        &self.index
    }

    /// Create a directory tree on the real filesystem.
    ///
    /// Archive-backed paths are read-only.
    pub fn create_dir_all(&self, path: &Path) -> Result<(), FsError> {
        trace!("zipfs create_dir_all {}", path.display());
        match self.route(path) {
            Route::Os(real) => self.os.create_dir_all(&real),
            Route::Archive(_) => Err(FsError::ReadOnly(path.to_path_buf())),
        }
    }

    /// Write a file on the real filesystem.
    ///
    /// Archive-backed paths are read-only.
    pub fn write_file(&self, path: &Path, data: &[u8]) -> Result<(), FsError> {
        trace!("zipfs write_file {}", path.display());
        match self.route(path) {
            Route::Os(real) => self.os.write_file(&real, data),
            Route::Archive(_) => Err(FsError::ReadOnly(path.to_path_buf())),
        }
    }

    fn route(&self, path: &Path) -> Route {
        let abs = if path.is_absolute() {
            paths::clean_path(path)
        } else {
            paths::clean_path(&self.cwd.join(path))
        };
        let key = host_key(&abs);
        if paths::is_rooted(&key, &self.mount_key) {
            Route::Archive(paths::strip_root(&key, &self.mount_key).to_string())
        } else {
            Route::Os(abs)
        }
    }

    fn lookup(&self, path: &Path, name: &str) -> Result<&ArchiveEntry, FsError> {
        self.index
            .get(name)
            .ok_or_else(|| FsError::NotFound(path.to_path_buf()))
    }
}

/// `/`-joined, canonical form of a cleaned host path, comparable with
/// [`paths::is_rooted`] on every platform.
fn host_key(path: &Path) -> String {
    let parts: Vec<String> = path
        .components()
        .filter_map(|c| match c {
            Component::Prefix(p) => Some(p.as_os_str().to_string_lossy().into_owned()),
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    paths::clean(&parts.join("/"))
}

impl<R: Read + Seek + Send> Backend for ZipFs<R> {
    fn current_dir(&self) -> Result<PathBuf, FsError> {
        Ok(self.cwd.clone())
    }

    fn open(&self, path: &Path) -> Result<FileReader, FsError> {
        trace!("zipfs open {}", path.display());
        let name = match self.route(path) {
            Route::Os(real) => return self.os.open(&real),
            Route::Archive(name) => name,
        };

        let entry = self.lookup(path, &name)?;
        let invalid = || FsError::InvalidTarget {
            path: path.to_path_buf(),
            expected: EntryKind::File,
            found: entry.kind(),
        };
        if entry.kind() != EntryKind::File {
            return Err(invalid());
        }
        let handle = entry.handle().ok_or_else(invalid)?;

        let mut archive = self.archive.lock().unwrap_or_else(PoisonError::into_inner);
        let mut member = archive
            .by_index(handle.0)
            .map_err(|e| zip_error(path, e))?;
        let reserve = usize::try_from(member.size()).unwrap_or(0).min(MAX_PREALLOC);
        let mut data = Vec::with_capacity(reserve);
        member
            .read_to_end(&mut data)
            .map_err(|e| FsError::from_io(path, e))?;
        Ok(Box::new(Cursor::new(data)))
    }

    fn list_names(&self, path: &Path) -> Result<Vec<String>, FsError> {
        trace!("zipfs list_names {}", path.display());
        match self.route(path) {
            Route::Os(real) => {
                let mut names = self.os.list_names(&real)?;
                if self.mount_parent.as_deref() == Some(real.as_path())
                    && let Some(mount_name) = &self.mount_name
                    && !names.iter().any(|n| n == mount_name)
                {
                    names.push(mount_name.clone());
                }
                Ok(names)
            }
            Route::Archive(name) => {
                let entry = self.lookup(path, &name)?;
                if entry.kind() != EntryKind::Directory {
                    return Err(FsError::InvalidTarget {
                        path: path.to_path_buf(),
                        expected: EntryKind::Directory,
                        found: entry.kind(),
                    });
                }
                Ok(entry.children().iter().cloned().collect())
            }
        }
    }

    fn stat(&self, path: &Path) -> Result<Metadata, FsError> {
        trace!("zipfs stat {}", path.display());
        match self.route(path) {
            Route::Os(real) => self.os.stat(&real),
            Route::Archive(name) => Ok(*self.lookup(path, &name)?.metadata()),
        }
    }
}
