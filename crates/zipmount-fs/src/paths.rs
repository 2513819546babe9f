//! Lexical path canonicalization.
//!
//! Archive member names always use `/`, whatever the host platform, so the
//! canonical-name helpers work on `&str`. [`clean_path`] is the `Path`
//! counterpart used for host paths. Nothing here touches the filesystem.

use std::path::{Component, Path, PathBuf};

/// Clean a name into its canonical form.
///
/// Drops `.` segments and empty segments, resolves `..` against the previous
/// segment, and never returns leading or trailing separators. The root
/// itself canonicalizes to `""`.
pub fn clean(name: &str) -> String {
    let rooted = name.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();
    for segment in name.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if parts.last().is_some_and(|p| *p != "..") {
                    parts.pop();
                } else if !rooted {
                    parts.push("..");
                }
            }
            s => parts.push(s),
        }
    }
    parts.join("/")
}

/// True iff `name` is `root` or lies beneath it.
///
/// The match is bounded by a separator, so root `abc` does not contain
/// `abcd`. The empty root contains every name.
pub fn is_rooted(name: &str, root: &str) -> bool {
    if root.is_empty() || name == root {
        return true;
    }
    name.strip_prefix(root).is_some_and(|rest| rest.starts_with('/'))
}

/// Remove `root` from the front of `name`, plus any separators it leaves.
pub fn strip_root<'a>(name: &'a str, root: &str) -> &'a str {
    name.strip_prefix(root).unwrap_or(name).trim_start_matches('/')
}

/// Split a canonical name into its parent and base name.
///
/// Top-level names have the root (`""`) as parent.
pub fn split_parent(name: &str) -> (&str, &str) {
    match name.rfind('/') {
        Some(i) => (&name[..i], &name[i + 1..]),
        None => ("", name),
    }
}

/// Lexically clean a host path, keeping its root.
///
/// An empty result becomes `.`. `..` above the root of an absolute path is
/// dropped; on a relative path it is kept.
pub fn clean_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    let mut depth = 0usize;
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => out.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                if depth > 0 {
                    out.pop();
                    depth -= 1;
                } else if !out.has_root() {
                    out.push("..");
                }
            }
            Component::Normal(s) => {
                out.push(s);
                depth += 1;
            }
        }
    }
    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}
