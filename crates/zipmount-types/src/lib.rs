//! zipmount-types: pure data types shared by every zipmount backend.
//!
//! Nothing in here touches the filesystem. Backends (`OsFs`, `ZipFs`,
//! `TraceFs`) and the `FsFacade` in `zipmount-fs` all speak these types:
//!
//! - [`EntryKind`] / [`Metadata`]: what `stat` reports
//! - [`ModKey`]: comparison-only fingerprint used for cache invalidation
//! - [`FsError`] / [`FsErrorKind`] / [`FsFailure`]: the error vocabulary

mod entry;
mod error;

pub use entry::{EntryKind, Metadata, ModKey};
pub use error::{FsError, FsErrorKind, FsFailure};
