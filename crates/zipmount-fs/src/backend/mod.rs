//! Filesystem backends.
//!
//! - **OsFs**: the real filesystem, as-is
//! - **TraceFs**: `OsFs` plus a record of every directory listed and file opened
//!
//! The archive-backed backend lives in [`crate::archive`]; all three
//! implement [`Backend`].

mod os;
mod trace;
mod traits;

pub use os::OsFs;
pub use trace::TraceFs;
pub use traits::{Backend, FileReader};
