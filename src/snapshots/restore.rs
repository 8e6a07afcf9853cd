use anyhow::Result;

use super::{Snapshot, Workspace};
use crate::error::PrerequisiteError;
use crate::extensions::{self, InstallOutcome, InstallReport, EXTENSIONS_FILE};
use crate::sync::{self, CopyOutcome, FileReport, ReencodePolicy};
use crate::ui;

#[derive(Debug, Default)]
pub struct RestoreReport {
    /// The snapshot restored, `None` when there was nothing to restore.
    pub snapshot: Option<Snapshot>,
    pub files: Vec<FileReport>,
    pub installs: Vec<InstallReport>,
}

/// Copy the latest snapshot back into the live user directory and
/// reinstall its extensions.
pub fn restore(ws: &Workspace<'_>) -> Result<RestoreReport> {
    let user_dir = &ws.profile.user_dir;
    if !user_dir.is_dir() {
        return Err(PrerequisiteError::UserDirMissing(user_dir.clone()).into());
    }
    if !ws.store.exists() {
        return Err(PrerequisiteError::ConfigsMissing(ws.store.root().to_path_buf()).into());
    }

    let Some(snapshot) = ws.store.latest()? else {
        ui::warn("No snapshots found in Configs/");
        return Ok(RestoreReport::default());
    };

    ui::info(&format!(
        "Syncing: {} → {}",
        snapshot.path.display(),
        user_dir.display()
    ));

    let mut files = Vec::new();

    for name in &ws.tracked.files {
        let source = snapshot.path.join(name);
        match sync::copy_if_exists(&source, user_dir) {
            Ok(report) => files.push(report),
            Err(e) => {
                ui::warn(&format!("Failed to sync {}: {:#}", name, e));
                files.push(FileReport {
                    destination: user_dir.join(name),
                    source,
                    outcome: CopyOutcome::Skipped {
                        reason: format!("{:#}", e),
                    },
                });
            }
        }
    }

    let policy = ReencodePolicy::from_config(ws.tracked);
    for dir in &ws.tracked.directories {
        let source = snapshot.path.join(dir);
        if !source.is_dir() {
            continue;
        }
        match sync::copy_dir_recursive(&source, &user_dir.join(dir), &policy) {
            Ok(reports) => {
                sync::log_reports(&reports);
                ui::info(&format!("Synced: {}/", dir));
                files.extend(reports);
            }
            Err(e) => ui::warn(&format!("Failed to sync {}/: {:#}", dir, e)),
        }
    }

    let mut installs = Vec::new();
    let extensions_path = snapshot.path.join(EXTENSIONS_FILE);
    if extensions_path.is_file() {
        match extensions::install_from_file(ws.manager, &extensions_path) {
            Ok(reports) => {
                let failed = reports
                    .iter()
                    .filter(|r| matches!(r.outcome, InstallOutcome::Failed { .. }))
                    .count();
                if failed == 0 {
                    ui::info(&format!("Extensions installed (forced): {}", reports.len()));
                } else {
                    ui::warn(&format!(
                        "Extensions installed (forced): {}, failed: {}",
                        reports.len() - failed,
                        failed
                    ));
                }
                installs = reports;
            }
            Err(e) => ui::warn(&format!("Failed to install extensions: {:#}", e)),
        }
    }

    ui::success("Sync complete.");
    ws.reveal(user_dir);

    Ok(RestoreReport {
        snapshot: Some(snapshot),
        files,
        installs,
    })
}
