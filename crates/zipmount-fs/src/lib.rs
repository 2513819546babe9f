//! zipmount-fs: read source trees packed in zip archives as if they were
//! ordinary directories.
//!
//! This crate provides:
//!
//! - **Backend**: the capability interface (cwd, open, list names, stat)
//! - **OsFs / TraceFs**: real filesystem pass-through, plain or recording
//! - **ZipFs**: a zip archive indexed once and mounted at a host path, with
//!   every other path falling through to the real filesystem
//! - **FsFacade**: path resolution, directory snapshots, whole-file reads and
//!   modification fingerprints over any backend
//! - **MountConfig**: TOML mount configuration
//!
//! ```no_run
//! use std::sync::Arc;
//! use zipmount_fs::{FsFacade, MountOptions, ZipFs};
//!
//! let zfs = ZipFs::open("deps.zip", MountOptions {
//!     mount_root: "/proj/node_modules".into(),
//!     zip_root: "node_modules/".into(),
//!     cwd: "/proj".into(),
//! })?;
//! let fs = FsFacade::new(Arc::new(zfs))?;
//! let source = fs.read_file("node_modules/pkg/lib/index.js")?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod archive;
pub mod backend;
pub mod config;
pub mod facade;
pub mod paths;

pub use archive::{ArchiveIndex, MountOptions, ZipFs};
pub use backend::{Backend, FileReader, OsFs, TraceFs};
pub use config::{ConfigError, MountConfig};
pub use facade::{DirEntries, Entry, FsFacade, WatchData};
pub use zipmount_types::{EntryKind, FsError, FsErrorKind, FsFailure, Metadata, ModKey};
