//! Snapshot management for VS Code configuration.
//!
//! Snapshots live under `Configs/` as directories named after the moment
//! they were taken (`YYYY-MM-DD-HHMMSS`). Every field is zero-padded, so
//! sorting names as plain strings sorts them by time.

mod collect;
mod restore;

pub use collect::{collect, CollectReport};
pub use restore::{restore, RestoreReport};

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use regex::Regex;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use walkdir::WalkDir;

use crate::cfg::TrackedConfig;
use crate::extensions::{self, ExtensionManager, EXTENSIONS_FILE};
use crate::platform::PlatformProfile;
use crate::sync::encoding;
use crate::ui;

pub const SNAPSHOT_NAME_FORMAT: &str = "%Y-%m-%d-%H%M%S";

fn snapshot_name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^\d{4}-\d{2}-\d{2}-\d{6}$").expect("Invalid snapshot name pattern")
    })
}

/// Directory name for a snapshot taken at `at`.
pub fn snapshot_name(at: NaiveDateTime) -> String {
    at.format(SNAPSHOT_NAME_FORMAT).to_string()
}

/// Parse a snapshot directory name back into its timestamp.
pub fn parse_snapshot_name(name: &str) -> Option<NaiveDateTime> {
    if !snapshot_name_pattern().is_match(name) {
        return None;
    }
    NaiveDateTime::parse_from_str(name, SNAPSHOT_NAME_FORMAT).ok()
}

/// The greatest name in ordinal string order.
pub fn latest_of<'a, I>(names: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    names.into_iter().max()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    pub name: String,
    pub path: PathBuf,
}

/// What a snapshot directory holds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SnapshotContents {
    pub settings: bool,
    pub keybindings: bool,
    pub snippet_files: usize,
    /// Identifiers in `extensions.txt`, `None` when the file is absent.
    pub extensions: Option<usize>,
    pub file_count: usize,
    pub size_bytes: u64,
}

impl Snapshot {
    pub fn created_at(&self) -> Option<NaiveDateTime> {
        parse_snapshot_name(&self.name)
    }

    pub fn contents(&self) -> SnapshotContents {
        let mut contents = SnapshotContents {
            settings: self.path.join("settings.json").is_file(),
            keybindings: self.path.join("keybindings.json").is_file(),
            ..Default::default()
        };

        let snippets = self.path.join("snippets");
        for entry in WalkDir::new(&self.path).into_iter().filter_map(|e| e.ok()) {
            if entry.file_type().is_file() {
                contents.file_count += 1;
                contents.size_bytes += entry.metadata().map(|m| m.len()).unwrap_or(0);
                if entry.path().starts_with(&snippets) {
                    contents.snippet_files += 1;
                }
            }
        }

        contents.extensions = fs::read(self.path.join(EXTENSIONS_FILE))
            .ok()
            .and_then(|bytes| {
                encoding::normalize(&bytes)
                    .ok()
                    .map(|text| extensions::parse_identifiers(&text).len())
            });

        contents
    }
}

/// The `Configs/` directory holding every snapshot.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    root: PathBuf,
}

impl SnapshotStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        SnapshotStore { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn exists(&self) -> bool {
        self.root.is_dir()
    }

    /// Every subdirectory, oldest first. A missing store is empty.
    pub fn list(&self) -> Result<Vec<Snapshot>> {
        if !self.exists() {
            return Ok(Vec::new());
        }

        let mut snapshots = Vec::new();
        for entry in fs::read_dir(&self.root)
            .with_context(|| format!("Failed to read {}", self.root.display()))?
        {
            let entry = entry?;
            if entry.path().is_dir() {
                snapshots.push(Snapshot {
                    name: entry.file_name().to_string_lossy().into_owned(),
                    path: entry.path(),
                });
            }
        }

        snapshots.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(snapshots)
    }

    pub fn latest(&self) -> Result<Option<Snapshot>> {
        let snapshots = self.list()?;
        let latest = latest_of(snapshots.iter().map(|s| s.name.as_str())).map(str::to_string);
        Ok(latest.and_then(|name| snapshots.into_iter().find(|s| s.name == name)))
    }

    /// Create the directory for a snapshot taken at `at`.
    ///
    /// Two collects within the same second share one directory.
    pub fn create(&self, at: NaiveDateTime) -> Result<Snapshot> {
        let name = snapshot_name(at);
        let path = self.root.join(&name);
        fs::create_dir_all(&path)
            .with_context(|| format!("Failed to create snapshot directory {}", path.display()))?;
        Ok(Snapshot { name, path })
    }
}

/// Everything a collect or sync needs, resolved once per run.
pub struct Workspace<'a> {
    pub profile: &'a PlatformProfile,
    pub store: &'a SnapshotStore,
    pub manager: &'a dyn ExtensionManager,
    pub tracked: &'a TrackedConfig,
    pub open_after: bool,
}

impl Workspace<'_> {
    /// Open `path` in the file browser if enabled. Failures are only logged.
    fn reveal(&self, path: &Path) {
        if !self.open_after {
            return;
        }
        if let Err(e) = self.profile.open_in_file_browser(path) {
            ui::warn(&format!("Failed to open directory: {:#}", e));
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::platform::PlatformKind;

    /// A Linux profile whose user directory sits under `home`.
    pub fn profile_in(home: &Path) -> PlatformProfile {
        PlatformProfile::for_kind(PlatformKind::Linux, home, None).unwrap()
    }
}
