//! Facade behavior over the real filesystem, the archive mount and the
//! tracing backend.

use std::io::Cursor;
use std::path::PathBuf;
use std::sync::Arc;

use rstest::{fixture, rstest};
use tempfile::TempDir;
use zipmount_fs::{EntryKind, FsErrorKind, FsFacade, MountOptions, OsFs, TraceFs, ZipFs};
use zipmount_testutil::ZipFixture;

/// A project tree on disk with `node_modules` mounted from an archive.
struct Project {
    tmp: TempDir,
    fs: FsFacade,
}

impl Project {
    fn path(&self, rel: &str) -> PathBuf {
        self.tmp.path().join(rel)
    }
}

#[fixture]
fn project() -> Project {
    let tmp = tempfile::tempdir().unwrap();
    std::fs::create_dir(tmp.path().join("src")).unwrap();
    std::fs::write(tmp.path().join("src/App.jsx"), b"import React from 'react';").unwrap();

    let bytes = ZipFixture::new()
        .dir("node_modules/")
        .dir("node_modules/react/")
        .file("node_modules/react/package.json", b"{\"main\": \"index.js\"}")
        .file("node_modules/react/index.js", b"module.exports = {};")
        .file("node_modules/react/README.md", b"# react")
        .file("node_modules/react/binary.node", &[0xff, 0xfe, 0x00])
        .finish();
    let zfs = ZipFs::from_reader(
        Cursor::new(bytes),
        MountOptions {
            mount_root: tmp.path().join("node_modules"),
            zip_root: "node_modules".to_string(),
            cwd: tmp.path().to_path_buf(),
        },
    )
    .unwrap();
    let fs = FsFacade::new(Arc::new(zfs)).unwrap();
    Project { tmp, fs }
}

#[rstest]
fn read_directory_is_idempotent(project: Project) {
    let first = project.fs.read_directory("node_modules/react").unwrap();
    let second = project.fs.read_directory("node_modules/react").unwrap();
    assert_eq!(first, second);
    assert_eq!(first.dir(), project.path("node_modules/react"));
    assert_eq!(
        first.keys().collect::<Vec<_>>(),
        vec!["binary.node", "index.js", "package.json", "readme.md"]
    );
}

#[rstest]
fn entries_are_unclassified_until_asked(project: Project) {
    let entries = project.fs.read_directory(".").unwrap();

    let modules = entries.get("NODE_MODULES").unwrap();
    assert!(modules.needs_stat());
    assert_eq!(modules.kind(), None);

    let classified = modules.classify(&project.fs);
    assert!(!classified.needs_stat());
    assert_eq!(classified.kind(), Some(EntryKind::Directory));

    // The snapshot still holds the unclassified entry.
    assert!(entries.get("node_modules").unwrap().needs_stat());
}

#[rstest]
fn lookup_folds_case_but_keeps_original_base(project: Project) {
    let entries = project.fs.read_directory(project.path("node_modules/react")).unwrap();
    let readme = entries.get("readme.MD").unwrap();
    assert_eq!(readme.base(), "README.md");
    assert_eq!(readme.dir(), project.path("node_modules/react"));
    assert!(entries.get("missing").is_none());
}

#[rstest]
fn classification_of_missing_entry_is_none(project: Project) {
    assert_eq!(project.fs.kind(project.path("src"), "gone.js"), None);
    assert_eq!(project.fs.kind("src", "App.jsx"), Some(EntryKind::File));
}

#[rstest]
fn read_file_from_archive_and_disk(project: Project) {
    assert_eq!(
        project.fs.read_file("node_modules/react/index.js").unwrap(),
        "module.exports = {};"
    );
    assert_eq!(
        project.fs.read_file(project.path("src/App.jsx")).unwrap(),
        "import React from 'react';"
    );
}

#[rstest]
fn read_file_failures_carry_canonical_kind(project: Project) {
    let missing = project.fs.read_file("src/missing.js").unwrap_err();
    assert_eq!(missing.canonical, FsErrorKind::NotFound);
    assert_eq!(missing.original.kind(), FsErrorKind::NotFound);

    let dir = project.fs.read_file("node_modules/react").unwrap_err();
    assert_eq!(dir.canonical, FsErrorKind::InvalidTarget);

    let binary = project.fs.read_file("node_modules/react/binary.node").unwrap_err();
    assert_eq!(binary.canonical, FsErrorKind::Io);
}

#[rstest]
fn read_directory_failures(project: Project) {
    let err = project.fs.read_directory("node_modules/react/nope").unwrap_err();
    assert_eq!(err.canonical, FsErrorKind::NotFound);

    let err = project.fs.read_directory("src/App.jsx").unwrap_err();
    assert_eq!(err.canonical, FsErrorKind::Io);
}

#[test]
fn mod_key_tracks_content_changes() {
    let tmp = tempfile::tempdir().unwrap();
    let file = tmp.path().join("a.js");
    std::fs::write(&file, b"one").unwrap();

    let fs = FsFacade::new(Arc::new(OsFs::new())).unwrap();
    let before = fs.mod_key(&file).unwrap();
    assert_eq!(before, fs.mod_key(&file).unwrap());

    std::fs::write(&file, b"three").unwrap();
    assert_ne!(before, fs.mod_key(&file).unwrap());

    let missing = fs.mod_key(tmp.path().join("b.js")).unwrap_err();
    assert_eq!(missing.kind(), FsErrorKind::NotFound);
}

#[rstest]
fn mod_key_of_archive_member_is_stable(project: Project) {
    let a = project.fs.mod_key("node_modules/react/index.js").unwrap();
    let b = project.fs.mod_key(project.path("node_modules/react/index.js")).unwrap();
    assert_eq!(a, b);
    assert_ne!(a, project.fs.mod_key("node_modules/react/README.md").unwrap());
}

#[rstest]
fn watch_data_is_empty(project: Project) {
    assert!(project.fs.watch_data().is_empty());
}

#[rstest]
#[should_panic(expected = "streamed open is not supported")]
fn open_file_is_unsupported(project: Project) {
    let _ = project.fs.open_file("src/App.jsx");
}

#[test]
fn trace_records_what_the_facade_touched() {
    let tmp = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(tmp.path().join("src/lib")).unwrap();
    std::fs::write(tmp.path().join("src/index.js"), b"index").unwrap();

    let tracer = Arc::new(TraceFs::new());
    let fs = FsFacade::new(tracer.clone()).unwrap();
    assert_eq!(tracer.scan_log(), "-- nothing was opened --");

    let src = tmp.path().join("src");
    let entries = fs.read_directory(&src).unwrap();
    for (_, entry) in entries.iter() {
        let _ = entry.classify(&fs);
    }
    fs.read_directory(&src).unwrap();
    fs.read_directory(src.join("missing")).unwrap_err();
    fs.read_file(src.join("index.js")).unwrap();
    fs.read_file(src.join("other.js")).unwrap_err();

    assert_eq!(tracer.listed_dirs(), vec![src.clone()]);
    assert_eq!(tracer.failed_dirs(), vec![src.join("missing")]);
    assert_eq!(tracer.opened_files(), vec![src.join("index.js")]);
    assert_eq!(
        tracer.scan_log(),
        format!(
            "\tdir: {}\n\n\ttry: {}\n\n\tfile: {}\n\n",
            src.display(),
            src.join("missing").display(),
            src.join("index.js").display()
        )
    );
}

#[test]
fn cwd_is_captured_once() {
    let tmp = tempfile::tempdir().unwrap();
    let zfs = ZipFs::from_reader(
        Cursor::new(ZipFixture::new().file("a.js", b"a").finish()),
        MountOptions {
            mount_root: tmp.path().join("m"),
            zip_root: String::new(),
            cwd: tmp.path().to_path_buf(),
        },
    )
    .unwrap();
    let fs = FsFacade::new(Arc::new(zfs)).unwrap();
    assert_eq!(fs.cwd(), tmp.path());
    assert_eq!(fs.to_absolute("m/a.js"), tmp.path().join("m/a.js"));
    assert_eq!(fs.read_file("m/a.js").unwrap(), "a");
}
