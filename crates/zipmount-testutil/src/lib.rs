//! Test utilities for zipmount.
//!
//! - [`ZipFixture`]: build a zip archive in memory, member by member, in
//!   exactly the order given
//! - [`set_unix_mode`]: rewrite a member's mode in the central directory, for
//!   fabricating archives the zip writer refuses to produce

#![allow(clippy::expect_used)]

use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Builder for an in-memory zip archive.
pub struct ZipFixture {
    writer: ZipWriter<Cursor<Vec<u8>>>,
}

impl Default for ZipFixture {
    fn default() -> Self {
        Self::new()
    }
}

impl ZipFixture {
    pub fn new() -> Self {
        Self {
            writer: ZipWriter::new(Cursor::new(Vec::new())),
        }
    }

    fn options() -> FileOptions {
        FileOptions::default().compression_method(CompressionMethod::Stored)
    }

    /// Add a directory member. A trailing `/` is appended by the writer.
    pub fn dir(mut self, name: &str) -> Self {
        self.writer
            .add_directory(name, Self::options())
            .expect("add directory");
        self
    }

    /// Add a regular file member.
    pub fn file(mut self, name: &str, contents: &[u8]) -> Self {
        self.writer
            .start_file(name, Self::options().unix_permissions(0o644))
            .expect("start file");
        self.writer.write_all(contents).expect("write file");
        self
    }

    /// Add a symlink member pointing at `target`.
    pub fn symlink(mut self, name: &str, target: &str) -> Self {
        self.writer
            .add_symlink(name, target, Self::options())
            .expect("add symlink");
        self
    }

    /// Finish the archive and return its bytes.
    pub fn finish(mut self) -> Vec<u8> {
        self.writer.finish().expect("finish archive").into_inner()
    }

    /// Finish the archive and write it to `dir/file_name`.
    pub fn write_to(self, dir: &Path, file_name: &str) -> PathBuf {
        let path = dir.join(file_name);
        std::fs::write(&path, self.finish()).expect("write archive");
        path
    }
}

const CENTRAL_HEADER: [u8; 4] = [0x50, 0x4b, 0x01, 0x02];
const CENTRAL_HEADER_LEN: usize = 46;

/// Set the unix mode (type bits included) recorded for member `name`.
///
/// Patches the central directory in place and marks the member as made on
/// unix. Returns false if no member has that exact name.
pub fn set_unix_mode(archive: &mut [u8], name: &str, mode: u32) -> bool {
    let mut i = 0;
    while i + CENTRAL_HEADER_LEN <= archive.len() {
        if archive[i..i + 4] != CENTRAL_HEADER {
            i += 1;
            continue;
        }
        let name_len = u16::from_le_bytes([archive[i + 28], archive[i + 29]]) as usize;
        let start = i + CENTRAL_HEADER_LEN;
        if archive.get(start..start + name_len) == Some(name.as_bytes()) {
            // Upper byte of "version made by": 3 = unix.
            archive[i + 5] = 3;
            let low = u16::from_le_bytes([archive[i + 38], archive[i + 39]]);
            let attrs = (mode << 16) | u32::from(low);
            archive[i + 38..i + 42].copy_from_slice(&attrs.to_le_bytes());
            return true;
        }
        i += 1;
    }
    false
}
