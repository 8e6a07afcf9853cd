//! Editor extension export and install.
//!
//! The editor is reached through the [`ExtensionManager`] trait so the
//! export/install drivers do not care how extensions are listed or
//! installed. [`CodeCli`] is the backend that shells out to VS Code's CLI.

mod code_cli;

pub use code_cli::{probe_on_path, resolve_cli, CodeCli, DEFAULT_CLI, MACOS_FALLBACK_PATHS};

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::sync::encoding;
use crate::ui;

/// File inside a snapshot holding one extension identifier per line.
pub const EXTENSIONS_FILE: &str = "extensions.txt";

/// Output of a list operation, kept byte for byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionListing {
    raw: Vec<u8>,
}

impl ExtensionListing {
    pub fn new(raw: impl Into<Vec<u8>>) -> Self {
        ExtensionListing { raw: raw.into() }
    }

    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// Non-blank lines, decoded lossily.
    pub fn identifiers(&self) -> Vec<String> {
        parse_identifiers(&String::from_utf8_lossy(&self.raw))
    }
}

/// Something that can list and install editor extensions.
pub trait ExtensionManager {
    fn name(&self) -> &str;
    fn list(&self) -> Result<ExtensionListing>;
    fn install(&self, id: &str) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    Installed,
    Failed { reason: String },
}

#[derive(Debug, Clone)]
pub struct InstallReport {
    pub id: String,
    pub outcome: InstallOutcome,
}

/// Trimmed, non-blank lines.
pub fn parse_identifiers(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// List extensions and write the listing to `path` byte for byte.
///
/// Returns how many identifiers were written.
pub fn export(manager: &dyn ExtensionManager, path: &Path) -> Result<usize> {
    let listing = manager
        .list()
        .with_context(|| format!("Failed to list extensions with {}", manager.name()))?;

    fs::write(path, listing.raw())
        .with_context(|| format!("Failed to write {}", path.display()))?;

    Ok(listing.identifiers().len())
}

/// Install every identifier, continuing past failures.
pub fn install_all(manager: &dyn ExtensionManager, ids: &[String]) -> Vec<InstallReport> {
    let pb = ui::progress_bar(ids.len() as u64, "Installing extensions");
    let mut reports = Vec::with_capacity(ids.len());

    for id in ids {
        pb.set_message(id.clone());
        let outcome = match manager.install(id) {
            Ok(()) => InstallOutcome::Installed,
            Err(e) => {
                let reason = format!("{:#}", e);
                pb.suspend(|| ui::warn(&format!("Failed to install extension {}: {}", id, reason)));
                InstallOutcome::Failed { reason }
            }
        };
        reports.push(InstallReport {
            id: id.clone(),
            outcome,
        });
        pb.inc(1);
    }

    pb.finish_and_clear();
    reports
}

/// Install every extension listed in a saved `extensions.txt`.
pub fn install_from_file(manager: &dyn ExtensionManager, path: &Path) -> Result<Vec<InstallReport>> {
    let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let text = encoding::normalize(&bytes)
        .with_context(|| format!("Failed to decode {}", path.display()))?;

    let ids = parse_identifiers(&text);
    Ok(install_all(manager, &ids))
}


#[cfg(test)]
mod tests {
    use super::testing::FakeManager;
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_identifiers_skips_blank_lines() {
        let ids = parse_identifiers("ms-python.python\n\n  \n\trust-lang.rust-analyzer  \r\n");
        assert_eq!(ids, vec!["ms-python.python", "rust-lang.rust-analyzer"]);
    }

    #[test]
    fn test_install_issues_one_call_for_one_identifier() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(EXTENSIONS_FILE);
        fs::write(&path, "ms-python.python\n\n  \n").unwrap();

        let manager = FakeManager::default();
        let reports = install_from_file(&manager, &path).unwrap();

        assert_eq!(*manager.installed.borrow(), vec!["ms-python.python"]);
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].outcome, InstallOutcome::Installed);
    }

    #[test]
    fn test_install_continues_after_failure() {
        let manager = FakeManager {
            failing: vec!["broken.ext".to_string()],
            ..Default::default()
        };
        let ids = vec![
            "a.one".to_string(),
            "broken.ext".to_string(),
            "c.three".to_string(),
        ];

        let reports = install_all(&manager, &ids);

        assert_eq!(manager.installed.borrow().len(), 3);
        assert!(matches!(reports[1].outcome, InstallOutcome::Failed { .. }));
        assert_eq!(reports[2].outcome, InstallOutcome::Installed);
    }

    #[test]
    fn test_install_from_file_with_bom() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(EXTENSIONS_FILE);
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice(b"esbenp.prettier-vscode\n");
        fs::write(&path, bytes).unwrap();

        let manager = FakeManager::default();
        install_from_file(&manager, &path).unwrap();

        assert_eq!(*manager.installed.borrow(), vec!["esbenp.prettier-vscode"]);
    }

    #[test]
    fn test_export_writes_listing_verbatim() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(EXTENSIONS_FILE);
        let manager = FakeManager {
            listing: Some(b"ms-python.python\nrust-lang.rust-analyzer\n".to_vec()),
            ..Default::default()
        };

        let count = export(&manager, &path).unwrap();

        assert_eq!(count, 2);
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "ms-python.python\nrust-lang.rust-analyzer\n"
        );
    }

    #[test]
    fn test_export_keeps_undecodable_bytes() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(EXTENSIONS_FILE);
        let raw: &[u8] = b"ms-python.python\n\xFF\xFEjunk\n";
        let manager = FakeManager {
            listing: Some(raw.to_vec()),
            ..Default::default()
        };

        let count = export(&manager, &path).unwrap();

        assert_eq!(count, 2);
        assert_eq!(fs::read(&path).unwrap(), raw);
    }

    #[test]
    fn test_export_empty_listing_creates_empty_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(EXTENSIONS_FILE);
        let manager = FakeManager {
            listing: Some(Vec::new()),
            ..Default::default()
        };

        assert_eq!(export(&manager, &path).unwrap(), 0);
        assert_eq!(fs::read(&path).unwrap(), b"");
    }

    #[test]
    fn test_export_failure_writes_nothing() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(EXTENSIONS_FILE);

        let err = export(&FakeManager::default(), &path).unwrap_err();

        assert!(format!("{:#}", err).contains("editor CLI not found"));
        assert!(!path.exists());
    }
}
