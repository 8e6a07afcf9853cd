use anyhow::Result;
use chrono::NaiveDateTime;

use super::{Snapshot, Workspace};
use crate::error::PrerequisiteError;
use crate::extensions::{self, EXTENSIONS_FILE};
use crate::sync::{self, CopyOutcome, FileReport, ReencodePolicy, SyncSummary};
use crate::ui;

#[derive(Debug)]
pub struct CollectReport {
    pub snapshot: Snapshot,
    pub files: Vec<FileReport>,
    /// Number of exported extensions, `None` if the export failed.
    pub extensions: Option<usize>,
}

/// Copy the live configuration into a new snapshot taken at `at`.
pub fn collect(ws: &Workspace<'_>, at: NaiveDateTime) -> Result<CollectReport> {
    let user_dir = &ws.profile.user_dir;
    if !user_dir.is_dir() {
        return Err(PrerequisiteError::UserDirMissing(user_dir.clone()).into());
    }

    let snapshot = ws.store.create(at)?;
    ui::info(&format!("Collecting {} → {}", user_dir.display(), snapshot.path.display()));

    let mut files = Vec::new();

    for name in &ws.tracked.files {
        let source = user_dir.join(name);
        match sync::copy_if_exists(&source, &snapshot.path) {
            Ok(report) => files.push(report),
            Err(e) => {
                ui::warn(&format!("Failed to copy {}: {:#}", name, e));
                files.push(FileReport {
                    destination: snapshot.path.join(name),
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
        let source = user_dir.join(dir);
        if !source.is_dir() {
            continue;
        }
        match sync::copy_dir_recursive(&source, &snapshot.path.join(dir), &policy) {
            Ok(reports) => {
                sync::log_reports(&reports);
                let summary = SyncSummary::from_reports(&reports);
                ui::info(&format!(
                    "Copied: {}/ ({} files)",
                    dir,
                    summary.copied + summary.raw
                ));
                files.extend(reports);
            }
            Err(e) => ui::warn(&format!("Failed to copy {}/: {:#}", dir, e)),
        }
    }

    let extensions_path = snapshot.path.join(EXTENSIONS_FILE);
    let extensions = match extensions::export(ws.manager, &extensions_path) {
        Ok(count) => {
            ui::info(&format!("Exported {} extensions: {}", count, EXTENSIONS_FILE));
            Some(count)
        }
        Err(e) => {
            ui::warn(&format!(
                "Failed to export extensions. Ensure the VS Code CLI is available. {:#}",
                e
            ));
            None
        }
    };

    ui::success(&format!("Done. Saved to: {}", snapshot.path.display()));
    ws.reveal(&snapshot.path);

    Ok(CollectReport {
        snapshot,
        files,
        extensions,
    })
}
