//! Command-line surface for zipmount.
//!
//! `ls`, `cat` and `stat` go through the archive mount when one is configured
//! (flags, `--config`, or the default config file) and through the real
//! filesystem otherwise. `trace` always reads the real filesystem and prints
//! what it touched.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{debug, info, warn};
use zipmount_fs::{Backend, EntryKind, FsFacade, Metadata, ModKey, MountConfig, OsFs, TraceFs};

#[derive(Debug, Parser)]
#[command(name = "zipmount", version, about = "Read source trees out of mounted zip archives")]
pub struct Cli {
    /// Mount configuration file (TOML).
    #[arg(long, global = true, conflicts_with = "zip")]
    pub config: Option<PathBuf>,

    /// Archive to mount.
    #[arg(long, global = true, requires = "mount")]
    pub zip: Option<PathBuf>,

    /// Host path where the archive appears.
    #[arg(long, global = true, requires = "zip")]
    pub mount: Option<PathBuf>,

    /// Subtree inside the archive to expose.
    #[arg(long, global = true, default_value = "")]
    pub zip_root: String,

    /// Ignore the default config file.
    #[arg(long, global = true)]
    pub no_config: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List a directory; directories get a trailing `/`.
    Ls {
        #[arg(default_value = ".")]
        dir: PathBuf,
    },
    /// Print a file.
    Cat { file: PathBuf },
    /// Print kind, size, mode and modification key.
    Stat {
        path: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Read paths through the real filesystem and print the scan log.
    Trace {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
}

#[derive(Serialize)]
struct StatReport<'a> {
    path: &'a Path,
    #[serde(flatten)]
    metadata: Metadata,
    mod_key: ModKey,
}

impl Cli {
    /// The mount to use, if any.
    pub fn mount_config(&self) -> Result<Option<MountConfig>> {
        if let (Some(archive), Some(mount_root)) = (&self.zip, &self.mount) {
            return Ok(Some(MountConfig {
                archive: archive.clone(),
                mount_root: mount_root.clone(),
                zip_root: self.zip_root.clone(),
                cwd: None,
            }));
        }

        let path = match &self.config {
            Some(path) => path.clone(),
            None if self.no_config => return Ok(None),
            None => {
                let path = MountConfig::default_path();
                if !path.is_file() {
                    debug!("no config at {}", path.display());
                    return Ok(None);
                }
                path
            }
        };
        let config = MountConfig::load(&path)
            .with_context(|| format!("Failed to load mount config {}", path.display()))?;
        Ok(Some(config))
    }

    fn backend(&self) -> Result<Arc<dyn Backend>> {
        match self.mount_config()? {
            Some(config) => {
                let zfs = config.mount().with_context(|| {
                    format!("Failed to mount {}", config.archive.display())
                })?;
                info!(
                    "mounted {} at {}",
                    config.archive.display(),
                    zfs.mount_root().display()
                );
                Ok(Arc::new(zfs))
            }
            None => Ok(Arc::new(OsFs::new())),
        }
    }
}

/// Execute `cli`, writing results to `out`.
pub fn run(cli: &Cli, out: &mut impl Write) -> Result<()> {
    match &cli.command {
        Command::Ls { dir } => {
            let fs = FsFacade::new(cli.backend()?)?;
            ls(&fs, dir, out)
        }
        Command::Cat { file } => {
            let fs = FsFacade::new(cli.backend()?)?;
            let text = fs.read_file(file)?;
            out.write_all(text.as_bytes())?;
            Ok(())
        }
        Command::Stat { path, json } => {
            let fs = FsFacade::new(cli.backend()?)?;
            stat(&fs, path, *json, out)
        }
        Command::Trace { paths } => trace(paths, out),
    }
}

fn ls(fs: &FsFacade, dir: &Path, out: &mut impl Write) -> Result<()> {
    let entries = fs.read_directory(dir)?;
    for (_, entry) in entries.iter() {
        let entry = entry.classify(fs);
        let suffix = if entry.kind() == Some(EntryKind::Directory) { "/" } else { "" };
        writeln!(out, "{}{}", entry.base(), suffix)?;
    }
    Ok(())
}

fn stat(fs: &FsFacade, path: &Path, json: bool, out: &mut impl Write) -> Result<()> {
    let abs = fs.absolute(path);
    let metadata = fs.backend().stat(&abs)?;
    let mod_key = fs.mod_key(&abs)?;

    if json {
        let report = StatReport { path: &abs, metadata, mod_key };
        serde_json::to_writer_pretty(&mut *out, &report)?;
        writeln!(out)?;
        return Ok(());
    }

    writeln!(out, "path: {}", abs.display())?;
    writeln!(out, "kind: {}", metadata.kind)?;
    writeln!(out, "size: {}", metadata.size)?;
    writeln!(out, "mode: {:o}", metadata.mode)?;
    writeln!(out, "mod_key: {}", serde_json::to_string(&mod_key)?)?;
    Ok(())
}

fn trace(paths: &[PathBuf], out: &mut impl Write) -> Result<()> {
    let tracer = Arc::new(TraceFs::new());
    let fs = FsFacade::new(tracer.clone())?;

    let mut failures = 0;
    for path in paths {
        let abs = fs.absolute(path);
        let result = match fs.backend().stat(&abs) {
            Ok(meta) if meta.is_dir() => fs.read_directory(&abs).map(|_| ()),
            Ok(_) => fs.read_file(&abs).map(|_| ()),
            Err(e) => Err(e.into()),
        };
        if let Err(e) = result {
            warn!("{}: {}", abs.display(), e);
            failures += 1;
        }
    }

    out.write_all(tracer.scan_log().as_bytes())?;
    if failures == paths.len() {
        bail!("none of the {} traced paths could be read", paths.len());
    }
    Ok(())
}
