//! Archive index: canonical name → entry, built once from the member list.

use std::collections::{BTreeSet, HashMap};
use std::io::{Read, Seek};

use chrono::NaiveDate;
use tracing::{debug, warn};
use zip::ZipArchive;

use zipmount_types::{EntryKind, FsError, Metadata};

use crate::paths;

const S_IFMT: u32 = 0o170000;
const S_IFREG: u32 = 0o100000;
const S_IFDIR: u32 = 0o040000;
const S_IFLNK: u32 = 0o120000;

/// Mode reported for directories the archive implies but never lists.
pub(crate) const IMPLIED_DIR_MODE: u32 = S_IFDIR | 0o755;

/// Position of a member inside the archive, used to open its contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemberHandle(pub(crate) usize);

/// One classified archive member, or a directory implied by one.
#[derive(Debug, Clone)]
pub struct ArchiveEntry {
    name: String,
    meta: Metadata,
    handle: Option<MemberHandle>,
    children: BTreeSet<String>,
}

impl ArchiveEntry {
    fn implied_dir(name: &str) -> Self {
        Self {
            name: name.to_string(),
            meta: Metadata::directory(IMPLIED_DIR_MODE),
            handle: None,
            children: BTreeSet::new(),
        }
    }

    /// Canonical name relative to the in-archive root (`""` is the root).
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> EntryKind {
        self.meta.kind
    }

    pub fn metadata(&self) -> &Metadata {
        &self.meta
    }

    /// Handle for reading contents. Only files have one.
    pub fn handle(&self) -> Option<MemberHandle> {
        match self.meta.kind {
            EntryKind::File => self.handle,
            _ => None,
        }
    }

    /// Base names of immediate children. Empty for non-directories.
    pub fn children(&self) -> &BTreeSet<String> {
        &self.children
    }
}

/// Immutable mapping from canonical name to entry.
///
/// Built in two passes: every member is indexed first, then children are
/// attached to their parents, so member order never changes the result.
#[derive(Debug, Default)]
pub struct ArchiveIndex {
    entries: HashMap<String, ArchiveEntry>,
}

impl ArchiveIndex {
    /// Index every member of `archive` that lies under `zip_root`.
    ///
    /// Fails with [`FsError::MalformedArchive`] when a member is neither a
    /// file, a directory nor a symlink, or when two members canonicalize to
    /// the same name with different kinds.
    pub fn build<R: Read + Seek>(
        archive: &mut ZipArchive<R>,
        zip_root: &str,
    ) -> Result<Self, FsError> {
        let root = paths::clean(zip_root);
        let mut entries: HashMap<String, ArchiveEntry> = HashMap::new();

        for i in 0..archive.len() {
            let member = archive
                .by_index_raw(i)
                .map_err(|e| FsError::MalformedArchive(format!("member #{i}: {e}")))?;

            let kind = classify(member.unix_mode(), member.is_dir()).map_err(|bits| {
                FsError::MalformedArchive(format!(
                    "unhandled file mode {bits:o} for member {:?}",
                    member.name()
                ))
            })?;

            let name = paths::clean(member.name());
            if escapes_root(&name) {
                warn!("archive member {:?} climbs above the archive root; skipping", member.name());
                continue;
            }
            if !paths::is_rooted(&name, &root) {
                continue;
            }
            let name = paths::strip_root(&name, &root).to_string();

            if let Some(existing) = entries.get(&name) {
                if existing.kind() != kind {
                    return Err(FsError::MalformedArchive(format!(
                        "duplicate entry {name:?}: {} and {}",
                        existing.kind(),
                        kind
                    )));
                }
                continue;
            }

            let meta = Metadata {
                kind,
                size: if kind == EntryKind::File { member.size() } else { 0 },
                mode: member.unix_mode().unwrap_or(match kind {
                    EntryKind::Directory => IMPLIED_DIR_MODE,
                    EntryKind::File => S_IFREG | 0o644,
                    EntryKind::Symlink => S_IFLNK | 0o777,
                }),
                mtime_sec: if kind == EntryKind::Directory {
                    0
                } else {
                    dos_time_to_unix(member.last_modified())
                },
                mtime_nsec: 0,
            };
            entries.insert(
                name.clone(),
                ArchiveEntry {
                    name,
                    meta,
                    handle: Some(MemberHandle(i)),
                    children: BTreeSet::new(),
                },
            );
        }

        if !entries.contains_key("") {
            debug!("archive has no member for root {:?}; synthesizing it", root);
            entries.insert(String::new(), ArchiveEntry::implied_dir(""));
        }

        let mut pending: Vec<String> = entries.keys().filter(|n| !n.is_empty()).cloned().collect();
        while let Some(name) = pending.pop() {
            let (parent, base) = paths::split_parent(&name);
            match entries.get_mut(parent) {
                Some(dir) if dir.kind() == EntryKind::Directory => {
                    dir.children.insert(base.to_string());
                }
                Some(other) => {
                    warn!(
                        "archive member {:?} sits under {:?}, which is a {}; skipping",
                        name,
                        parent,
                        other.kind()
                    );
                }
                None => {
                    warn!("no entry found for dir {:?} (parent of {:?}); synthesizing it", parent, name);
                    let mut dir = ArchiveEntry::implied_dir(parent);
                    dir.children.insert(base.to_string());
                    entries.insert(parent.to_string(), dir);
                    pending.push(parent.to_string());
                }
            }
        }

        debug!("indexed {} archive entries under root {:?}", entries.len(), root);
        Ok(Self { entries })
    }

    /// Look up an entry by canonical name.
    pub fn get(&self, name: &str) -> Option<&ArchiveEntry> {
        self.entries.get(name)
    }

    /// Number of entries, the root included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false once built: the root entry exists.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Classify a member by its unix mode, falling back to the trailing-slash
/// convention when the archive recorded none.
///
/// Returns the offending type bits for anything that is not a file,
/// directory or symlink.
fn classify(unix_mode: Option<u32>, is_dir: bool) -> Result<EntryKind, u32> {
    let Some(mode) = unix_mode else {
        return Ok(if is_dir { EntryKind::Directory } else { EntryKind::File });
    };
    match mode & S_IFMT {
        0 | S_IFREG if is_dir => Ok(EntryKind::Directory),
        0 | S_IFREG => Ok(EntryKind::File),
        S_IFDIR => Ok(EntryKind::Directory),
        S_IFLNK => Ok(EntryKind::Symlink),
        other => Err(other),
    }
}

/// A cleaned name that still starts with `..` points outside the archive.
fn escapes_root(name: &str) -> bool {
    name == ".." || name.starts_with("../")
}

/// Zip stores local DOS date-times; they are read as UTC.
fn dos_time_to_unix(dt: zip::DateTime) -> i64 {
    NaiveDate::from_ymd_opt(i32::from(dt.year()), u32::from(dt.month()), u32::from(dt.day()))
        .and_then(|d| {
            d.and_hms_opt(
                u32::from(dt.hour()),
                u32::from(dt.minute()),
                u32::from(dt.second()),
            )
        })
        .map(|t| t.and_utc().timestamp())
        .unwrap_or(0)
}
