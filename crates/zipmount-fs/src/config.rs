//! Mount configuration.
//!
//! A mount is described by a small TOML file:
//!
//! ```toml
//! archive = "deps.zip"
//! mount_root = "node_modules"
//! zip_root = "node_modules/"
//! # cwd = "/path/to/project"   # optional, defaults to the process cwd
//! ```
//!
//! Relative `archive` and `mount_root` paths are resolved against `cwd`.
//! The default location follows XDG: `$XDG_CONFIG_HOME/zipmount/mount.toml`.

use std::path::{Path, PathBuf};

use directories::BaseDirs;
use serde::Deserialize;
use thiserror::Error;
use zipmount_types::FsError;

use crate::archive::{MountOptions, ZipFs};
use crate::paths::clean_path;

/// Errors loading a mount configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid mount config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Everything needed to mount an archive. Fixed once the mount is built.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MountConfig {
    /// Archive file on the real filesystem.
    pub archive: PathBuf,
    /// Host path at which the archive root appears.
    pub mount_root: PathBuf,
    /// Subtree inside the archive to expose.
    #[serde(default)]
    pub zip_root: String,
    /// Working directory for relative paths.
    #[serde(default)]
    pub cwd: Option<PathBuf>,
}

impl MountConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Load from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Default config location: `$XDG_CONFIG_HOME/zipmount/mount.toml`.
    pub fn default_path() -> PathBuf {
        BaseDirs::new()
            .map(|d| d.config_dir().to_path_buf())
            .unwrap_or_else(|| {
                std::env::var("HOME")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| PathBuf::from("/tmp"))
                    .join(".config")
            })
            .join("zipmount")
            .join("mount.toml")
    }

    /// The working directory, falling back to the process's own.
    pub fn resolved_cwd(&self) -> Result<PathBuf, FsError> {
        match &self.cwd {
            Some(cwd) => Ok(cwd.clone()),
            None => std::env::current_dir().map_err(|e| FsError::from_io(".", e)),
        }
    }

    /// Absolute archive path.
    pub fn archive_path(&self) -> Result<PathBuf, FsError> {
        Ok(resolve(&self.resolved_cwd()?, &self.archive))
    }

    /// Mount options with every path made absolute.
    pub fn options(&self) -> Result<MountOptions, FsError> {
        let cwd = self.resolved_cwd()?;
        Ok(MountOptions {
            mount_root: resolve(&cwd, &self.mount_root),
            zip_root: self.zip_root.clone(),
            cwd,
        })
    }

    /// Open the archive and mount it.
    pub fn mount(&self) -> Result<ZipFs, FsError> {
        ZipFs::open(self.archive_path()?, self.options()?)
    }
}

fn resolve(cwd: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        clean_path(path)
    } else {
        clean_path(&cwd.join(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full() {
        let config = MountConfig::from_toml_str(
            r#"
            archive = "deps.zip"
            mount_root = "node_modules"
            zip_root = "node_modules/"
            cwd = "/proj"
            "#,
        )
        .unwrap();

        assert_eq!(config.zip_root, "node_modules/");
        assert_eq!(config.archive_path().unwrap(), PathBuf::from("/proj/deps.zip"));
        let options = config.options().unwrap();
        assert_eq!(options.mount_root, PathBuf::from("/proj/node_modules"));
        assert_eq!(options.cwd, PathBuf::from("/proj"));
    }

    #[test]
    fn test_defaults() {
        let config =
            MountConfig::from_toml_str("archive = \"/a.zip\"\nmount_root = \"/m\"\n").unwrap();
        assert_eq!(config.zip_root, "");
        assert_eq!(config.cwd, None);
        assert_eq!(config.archive_path().unwrap(), PathBuf::from("/a.zip"));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = MountConfig::from_toml_str("archive = \"a\"\nmount_root = \"m\"\nbogus = 1\n")
            .unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = MountConfig::load(dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_default_path_under_zipmount() {
        let path = MountConfig::default_path();
        assert!(path.ends_with("zipmount/mount.toml"));
    }
}
