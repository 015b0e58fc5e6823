//! # para-cli
//!
//! Input plumbing for the `para-report` binary: loading a host snapshot and
//! resolving note bodies from inline content or a vault directory on disk.

use std::io;
use std::path::{Component, Path, PathBuf};

use anyhow::Context;
use para_core::{AnalyticsConfig, ContentSource, Error, InlineContent, VaultSnapshot};
use tracing::{info, warn};

/// Note bodies read from files under a vault root.
#[derive(Debug, Clone)]
pub struct VaultDir {
    root: PathBuf,
}

impl VaultDir {
    /// Open a vault root, which must be an existing directory.
    pub fn open(root: impl Into<PathBuf>) -> para_core::Result<Self> {
        let root = root.into();
        if !std::fs::metadata(&root)?.is_dir() {
            return Err(Error::InvalidInput(format!(
                "vault root is not a directory: {}",
                root.display()
            )));
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a vault-relative path, refusing anything that escapes the root.
    fn resolve(&self, path: &str) -> io::Result<PathBuf> {
        let rel = Path::new(path);
        let escapes = rel
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("path outside vault: {}", path),
            ));
        }
        Ok(self.root.join(rel))
    }
}

impl ContentSource for VaultDir {
    fn read_content(&self, path: &str) -> io::Result<String> {
        std::fs::read_to_string(self.resolve(path)?)
    }
}

/// Inline snapshot content first, then the vault directory when one is set.
pub struct SnapshotContent<'a> {
    inline: InlineContent<'a>,
    vault: Option<VaultDir>,
}

impl<'a> SnapshotContent<'a> {
    pub fn new(snapshot: &'a VaultSnapshot, vault: Option<VaultDir>) -> Self {
        Self {
            inline: snapshot.inline_content(),
            vault,
        }
    }
}

impl ContentSource for SnapshotContent<'_> {
    fn read_content(&self, path: &str) -> io::Result<String> {
        match self.inline.read_content(path) {
            Ok(content) => Ok(content),
            Err(inline_err) => match &self.vault {
                Some(vault) => vault.read_content(path).map_err(|e| {
                    if e.kind() != io::ErrorKind::NotFound {
                        warn!(note_path = %path, error = %e, "Failed to read note content");
                    }
                    e
                }),
                None => Err(inline_err),
            },
        }
    }
}

/// Read and parse a snapshot file.
pub fn load_snapshot(path: &Path) -> anyhow::Result<VaultSnapshot> {
    let snapshot = VaultSnapshot::from_file(path)
        .with_context(|| format!("Failed to load snapshot {}", path.display()))?;
    info!(note_count = snapshot.notes.len(), "Snapshot loaded");
    Ok(snapshot)
}

/// Command-line overrides applied on top of the environment configuration.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub pipeline_window_days: Option<u32>,
    pub flow_window_days: Option<u32>,
    pub utc_offset_minutes: Option<i32>,
}

impl ConfigOverrides {
    /// Apply the overrides and validate the result.
    pub fn apply(&self, mut config: AnalyticsConfig) -> anyhow::Result<AnalyticsConfig> {
        if let Some(days) = self.pipeline_window_days {
            config.pipeline_window_days = days;
        }
        if let Some(days) = self.flow_window_days {
            config.flow_window_days = (days > 0).then_some(days);
        }
        if let Some(minutes) = self.utc_offset_minutes {
            config.utc_offset_minutes = minutes;
        }
        config.validate().context("Invalid configuration")?;
        Ok(config)
    }
}
