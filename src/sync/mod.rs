//! File synchronization between the VS Code user directory and a snapshot.
//!
//! Copies overwrite their destination and normalize text to UTF-8 without a
//! byte-order mark. Every copied entry produces a [`FileReport`]; one failed
//! entry never stops its siblings from being copied.

pub mod encoding;

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::cfg::TrackedConfig;
use crate::ui;

/// What happened to a single file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CopyOutcome {
    /// Copied and stored as UTF-8 without BOM (or not a re-encoded type).
    Copied,
    /// Copied, but the content could not be decoded so the raw bytes were kept.
    CopiedRaw { reason: String },
    /// Nothing was written.
    Skipped { reason: String },
}

#[derive(Debug, Clone)]
pub struct FileReport {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub outcome: CopyOutcome,
}

impl FileReport {
    pub fn is_copied(&self) -> bool {
        !matches!(self.outcome, CopyOutcome::Skipped { .. })
    }
}

/// Counts per outcome across a batch of reports.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SyncSummary {
    pub copied: usize,
    pub raw: usize,
    pub skipped: usize,
}

impl SyncSummary {
    pub fn from_reports(reports: &[FileReport]) -> Self {
        let mut summary = SyncSummary::default();
        for report in reports {
            match report.outcome {
                CopyOutcome::Copied => summary.copied += 1,
                CopyOutcome::CopiedRaw { .. } => summary.raw += 1,
                CopyOutcome::Skipped { .. } => summary.skipped += 1,
            }
        }
        summary
    }
}

/// File extensions re-encoded during directory copies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReencodePolicy {
    extensions: Vec<String>,
}

impl ReencodePolicy {
    pub fn new<S: AsRef<str>>(extensions: &[S]) -> Self {
        ReencodePolicy {
            extensions: extensions
                .iter()
                .map(|e| e.as_ref().trim_start_matches('.').to_lowercase())
                .collect(),
        }
    }

    pub fn from_config(tracked: &TrackedConfig) -> Self {
        Self::new(&tracked.reencode_extensions)
    }

    pub fn applies_to(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                let ext = ext.to_lowercase();
                self.extensions.iter().any(|e| *e == ext)
            })
            .unwrap_or(false)
    }
}

impl Default for ReencodePolicy {
    fn default() -> Self {
        Self::from_config(&TrackedConfig::default())
    }
}

/// Copy `src_file` into `dst_dir` if it exists, always re-encoding it.
///
/// A missing source is reported as skipped and touches nothing on disk.
pub fn copy_if_exists(src_file: &Path, dst_dir: &Path) -> Result<FileReport> {
    let file_name = src_file
        .file_name()
        .with_context(|| format!("Invalid source file path: {}", src_file.display()))?;
    let destination = dst_dir.join(file_name);

    if !src_file.is_file() {
        return Ok(FileReport {
            source: src_file.to_path_buf(),
            destination,
            outcome: CopyOutcome::Skipped {
                reason: "source not found".to_string(),
            },
        });
    }

    fs::create_dir_all(dst_dir)
        .with_context(|| format!("Failed to create directory {}", dst_dir.display()))?;

    let outcome = copy_file(src_file, &destination, true)?;
    let name = file_name.to_string_lossy();
    match &outcome {
        CopyOutcome::CopiedRaw { reason } => {
            ui::warn(&format!("Copied without re-encoding: {} ({})", name, reason))
        }
        _ => ui::info(&format!("Copied: {}", name)),
    }

    Ok(FileReport {
        source: src_file.to_path_buf(),
        destination,
        outcome,
    })
}

/// Copy the whole tree under `src_dir` into `dst_dir`.
///
/// Hidden files and symlinked entries are included. Only failing to create
/// `dst_dir` itself is an error; anything below it ends up in the reports.
pub fn copy_dir_recursive(
    src_dir: &Path,
    dst_dir: &Path,
    policy: &ReencodePolicy,
) -> Result<Vec<FileReport>> {
    fs::create_dir_all(dst_dir)
        .with_context(|| format!("Failed to create directory {}", dst_dir.display()))?;

    let mut reports = Vec::new();

    for entry in WalkDir::new(src_dir)
        .min_depth(1)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                let source = e.path().unwrap_or(src_dir).to_path_buf();
                reports.push(FileReport {
                    destination: destination_for(&source, src_dir, dst_dir),
                    source,
                    outcome: CopyOutcome::Skipped {
                        reason: e.to_string(),
                    },
                });
                continue;
            }
        };

        let source = entry.path().to_path_buf();
        let destination = destination_for(&source, src_dir, dst_dir);

        if entry.file_type().is_dir() {
            if let Err(e) = fs::create_dir_all(&destination) {
                reports.push(FileReport {
                    source,
                    destination,
                    outcome: CopyOutcome::Skipped {
                        reason: format!("failed to create directory: {}", e),
                    },
                });
            }
            continue;
        }

        let outcome = if entry.file_type().is_file() {
            match copy_file(&source, &destination, policy.applies_to(&source)) {
                Ok(outcome) => outcome,
                Err(e) => CopyOutcome::Skipped {
                    reason: format!("{:#}", e),
                },
            }
        } else {
            CopyOutcome::Skipped {
                reason: "not a regular file".to_string(),
            }
        };

        reports.push(FileReport {
            source,
            destination,
            outcome,
        });
    }

    Ok(reports)
}

/// Print one line per report: details for clean copies, warnings otherwise.
pub fn log_reports(reports: &[FileReport]) {
    for report in reports {
        match &report.outcome {
            CopyOutcome::Copied => ui::detail(&format!("copied {}", report.source.display())),
            CopyOutcome::CopiedRaw { reason } => ui::warn(&format!(
                "Copied without re-encoding: {} ({})",
                report.source.display(),
                reason
            )),
            CopyOutcome::Skipped { reason } => ui::warn(&format!(
                "Skipped: {} ({})",
                report.source.display(),
                reason
            )),
        }
    }
}

fn destination_for(source: &Path, src_dir: &Path, dst_dir: &Path) -> PathBuf {
    match source.strip_prefix(src_dir) {
        Ok(rel) => dst_dir.join(rel),
        Err(_) => dst_dir.to_path_buf(),
    }
}

/// Copy one file, optionally normalize it, and carry over its mtime.
fn copy_file(source: &Path, destination: &Path, reencode: bool) -> Result<CopyOutcome> {
    let metadata = fs::metadata(source)
        .with_context(|| format!("Failed to read metadata for {}", source.display()))?;

    fs::copy(source, destination).with_context(|| {
        format!(
            "Failed to copy {} to {}",
            source.display(),
            destination.display()
        )
    })?;

    let outcome = if reencode {
        match reencode_in_place(destination) {
            Ok(()) => CopyOutcome::Copied,
            Err(e) => CopyOutcome::CopiedRaw {
                reason: format!("{:#}", e),
            },
        }
    } else {
        CopyOutcome::Copied
    };

    let mtime = filetime::FileTime::from_last_modification_time(&metadata);
    if let Err(e) = filetime::set_file_mtime(destination, mtime) {
        ui::detail(&format!(
            "could not keep modification time of {}: {}",
            destination.display(),
            e
        ));
    }

    Ok(outcome)
}

/// Rewrite `path` as UTF-8 without BOM. Leaves the file alone when it already is.
fn reencode_in_place(path: &Path) -> Result<()> {
    let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let text = encoding::normalize(&bytes)?;
    if text.as_bytes() != bytes.as_slice() {
        fs::write(path, text.as_bytes())
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

    fn with_bom(text: &str) -> Vec<u8> {
        let mut bytes = BOM.to_vec();
        bytes.extend_from_slice(text.as_bytes());
        bytes
    }

    #[test]
    fn test_copy_if_exists_missing_source_touches_nothing() {
        let temp = TempDir::new().unwrap();
        let dst = temp.path().join("snapshot");

        let report = copy_if_exists(&temp.path().join("settings.json"), &dst).unwrap();

        assert!(matches!(report.outcome, CopyOutcome::Skipped { .. }));
        assert!(!dst.exists());
    }

    #[test]
    fn test_copy_if_exists_strips_bom_and_overwrites() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("settings.json");
        let dst = temp.path().join("out");
        fs::create_dir_all(&dst).unwrap();
        fs::write(dst.join("settings.json"), "old").unwrap();
        fs::write(&src, with_bom("{\"a\": 1}")).unwrap();

        let report = copy_if_exists(&src, &dst).unwrap();

        assert_eq!(report.outcome, CopyOutcome::Copied);
        assert_eq!(report.destination, dst.join("settings.json"));
        assert_eq!(fs::read(dst.join("settings.json")).unwrap(), b"{\"a\": 1}");
    }

    #[test]
    fn test_copy_if_exists_keeps_raw_bytes_when_not_text() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("keybindings.json");
        let binary: Vec<u8> = vec![0x00, 0xFF, 0xC3, 0x28];
        fs::write(&src, &binary).unwrap();

        let dst = temp.path().join("out");
        let report = copy_if_exists(&src, &dst).unwrap();

        assert!(matches!(report.outcome, CopyOutcome::CopiedRaw { .. }));
        assert_eq!(fs::read(dst.join("keybindings.json")).unwrap(), binary);
    }

    #[test]
    fn test_copy_dir_recursive_copies_nested_and_hidden() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("snippets");
        fs::create_dir_all(src.join("lang").join("deep")).unwrap();
        fs::write(src.join("rust.json"), "{}").unwrap();
        fs::write(src.join(".hidden.code-snippets"), "{}").unwrap();
        fs::write(src.join("lang").join("deep").join("go.json"), "{\"go\": 1}").unwrap();
        fs::create_dir_all(src.join("empty")).unwrap();

        let dst = temp.path().join("copy");
        let reports = copy_dir_recursive(&src, &dst, &ReencodePolicy::default()).unwrap();

        assert_eq!(SyncSummary::from_reports(&reports).copied, 3);
        assert!(dst.join(".hidden.code-snippets").exists());
        assert!(dst.join("empty").is_dir());
        assert_eq!(
            fs::read_to_string(dst.join("lang").join("deep").join("go.json")).unwrap(),
            "{\"go\": 1}"
        );
    }

    #[test]
    fn test_copy_dir_recursive_reencodes_only_listed_extensions() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("src");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("python.CODE-SNIPPETS"), with_bom("{}")).unwrap();
        fs::write(src.join("notes.md"), with_bom("# notes")).unwrap();

        let dst = temp.path().join("dst");
        copy_dir_recursive(&src, &dst, &ReencodePolicy::default()).unwrap();

        assert_eq!(fs::read(dst.join("python.CODE-SNIPPETS")).unwrap(), b"{}");
        assert_eq!(fs::read(dst.join("notes.md")).unwrap(), with_bom("# notes"));
    }

    #[test]
    fn test_copy_dir_recursive_keeps_binary_snippet_raw() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("src");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("broken.json"), b"\xFF\xFE\x00").unwrap();
        fs::write(src.join("ok.json"), "{}").unwrap();

        let dst = temp.path().join("dst");
        let reports = copy_dir_recursive(&src, &dst, &ReencodePolicy::default()).unwrap();

        let summary = SyncSummary::from_reports(&reports);
        assert_eq!(summary, SyncSummary { copied: 1, raw: 1, skipped: 0 });
        assert_eq!(fs::read(dst.join("broken.json")).unwrap(), b"\xFF\xFE\x00");
    }

    #[cfg(unix)]
    #[test]
    fn test_copy_dir_recursive_isolates_failures() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("src");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("a.json"), "{}").unwrap();
        std::os::unix::fs::symlink(temp.path().join("missing"), src.join("b.json")).unwrap();
        fs::write(src.join("c.json"), "{}").unwrap();

        let dst = temp.path().join("dst");
        let reports = copy_dir_recursive(&src, &dst, &ReencodePolicy::default()).unwrap();

        let summary = SyncSummary::from_reports(&reports);
        assert_eq!(summary.copied, 2);
        assert_eq!(summary.skipped, 1);
        assert!(dst.join("a.json").exists());
        assert!(dst.join("c.json").exists());
    }

    #[test]
    fn test_copy_keeps_modification_time() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("settings.json");
        fs::write(&src, with_bom("{}")).unwrap();
        let mtime = filetime::FileTime::from_unix_time(1_600_000_000, 0);
        filetime::set_file_mtime(&src, mtime).unwrap();

        let dst = temp.path().join("out");
        copy_if_exists(&src, &dst).unwrap();

        let copied = fs::metadata(dst.join("settings.json")).unwrap();
        assert_eq!(filetime::FileTime::from_last_modification_time(&copied), mtime);
    }

    #[test]
    fn test_reencode_policy_matching() {
        let policy = ReencodePolicy::new(&[".JSON", "txt"]);
        assert!(policy.applies_to(Path::new("a/settings.json")));
        assert!(policy.applies_to(Path::new("extensions.TXT")));
        assert!(!policy.applies_to(Path::new("image.png")));
        assert!(!policy.applies_to(Path::new("Makefile")));
    }
}
