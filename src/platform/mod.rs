//! Platform capability resolution.
//!
//! Everything that differs between Windows, macOS and Linux is decided once
//! at startup and captured in a [`PlatformProfile`]: where VS Code keeps its
//! user configuration, which shell carries editor CLI invocations, and which
//! program opens a folder in the file browser.

mod info;
mod shell;

pub use info::SystemInfo;
pub use shell::{Shell, ShellStyle};

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::cfg::Config;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformKind {
    Windows,
    MacOs,
    Linux,
}

impl PlatformKind {
    pub fn current() -> Self {
        if cfg!(windows) {
            PlatformKind::Windows
        } else if cfg!(target_os = "macos") {
            PlatformKind::MacOs
        } else {
            PlatformKind::Linux
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            PlatformKind::Windows => "Windows",
            PlatformKind::MacOs => "macOS",
            PlatformKind::Linux => "Linux",
        }
    }

    pub fn default_shell(&self) -> Shell {
        match self {
            PlatformKind::Windows => Shell::new("cmd.exe", ShellStyle::Cmd),
            PlatformKind::MacOs => Shell::new("/bin/zsh", ShellStyle::Posix),
            PlatformKind::Linux => Shell::new("/bin/bash", ShellStyle::Posix),
        }
    }

    pub fn file_browser(&self) -> &'static str {
        match self {
            PlatformKind::Windows => "explorer.exe",
            PlatformKind::MacOs => "open",
            PlatformKind::Linux => "xdg-open",
        }
    }
}

/// VS Code's user directory for a platform.
///
/// `app_data` is only consulted on Windows, where it is `%APPDATA%`.
pub fn user_dir_for(kind: PlatformKind, home: &Path, app_data: Option<&Path>) -> Result<PathBuf> {
    let dir = match kind {
        PlatformKind::Windows => app_data
            .context("Failed to find the AppData directory")?
            .join("Code")
            .join("User"),
        PlatformKind::MacOs => home
            .join("Library")
            .join("Application Support")
            .join("Code")
            .join("User"),
        PlatformKind::Linux => home.join(".config").join("Code").join("User"),
    };
    Ok(dir)
}

/// Immutable per-run platform capabilities.
#[derive(Debug, Clone)]
pub struct PlatformProfile {
    pub kind: PlatformKind,
    pub user_dir: PathBuf,
    pub shell: Shell,
    pub file_browser: String,
}

impl PlatformProfile {
    pub fn detect() -> Result<Self> {
        let home = dirs::home_dir().context("Failed to find home directory")?;
        let app_data = dirs::config_dir();
        Self::for_kind(PlatformKind::current(), &home, app_data.as_deref())
    }

    pub fn for_kind(kind: PlatformKind, home: &Path, app_data: Option<&Path>) -> Result<Self> {
        Ok(PlatformProfile {
            kind,
            user_dir: user_dir_for(kind, home, app_data)?,
            shell: kind.default_shell(),
            file_browser: kind.file_browser().to_string(),
        })
    }

    /// Apply `[editor]` overrides from the config file.
    pub fn with_overrides(mut self, config: &Config) -> Self {
        if let Some(user_dir) = config.user_dir_override() {
            self.user_dir = user_dir;
        }
        if let Some(shell) = &config.editor.shell {
            self.shell = self.shell.with_program(shell.as_str());
        }
        self
    }

    /// Launch the file browser on `path` without waiting for it.
    pub fn open_in_file_browser(&self, path: &Path) -> Result<()> {
        Command::new(&self.file_browser)
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .with_context(|| format!("Failed to launch {}", self.file_browser))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_dir_policy_table() {
        let home = Path::new("/home/alice");

        assert_eq!(
            user_dir_for(PlatformKind::Linux, home, None).unwrap(),
            home.join(".config").join("Code").join("User")
        );
        assert_eq!(
            user_dir_for(PlatformKind::MacOs, home, None).unwrap(),
            home.join("Library/Application Support/Code/User")
        );

        let app_data = Path::new("/users/alice/AppData/Roaming");
        assert_eq!(
            user_dir_for(PlatformKind::Windows, home, Some(app_data)).unwrap(),
            app_data.join("Code").join("User")
        );
    }

    #[test]
    fn test_windows_requires_app_data() {
        let err = user_dir_for(PlatformKind::Windows, Path::new("/home/alice"), None).unwrap_err();
        assert!(err.to_string().contains("AppData"));
    }

    #[test]
    fn test_shell_and_browser_per_platform() {
        let win = PlatformKind::Windows;
        assert_eq!(win.default_shell().program(), "cmd.exe");
        assert_eq!(win.default_shell().style(), ShellStyle::Cmd);
        assert_eq!(win.file_browser(), "explorer.exe");

        assert_eq!(PlatformKind::MacOs.default_shell().style(), ShellStyle::Posix);
        assert_eq!(PlatformKind::MacOs.file_browser(), "open");
        assert_eq!(PlatformKind::Linux.default_shell().program(), "/bin/bash");
        assert_eq!(PlatformKind::Linux.file_browser(), "xdg-open");
    }

    #[test]
    fn test_missing_user_dir_is_not_an_error() {
        let profile =
            PlatformProfile::for_kind(PlatformKind::Linux, Path::new("/nonexistent/home"), None)
                .unwrap();
        assert!(!profile.user_dir.exists());
    }

    #[test]
    fn test_overrides_from_config() {
        let mut config = Config::default();
        config.editor.user_dir = Some("/tmp/vscode-user".to_string());
        config.editor.shell = Some("/bin/sh".to_string());

        let profile = PlatformProfile::for_kind(PlatformKind::Linux, Path::new("/home/bob"), None)
            .unwrap()
            .with_overrides(&config);

        assert_eq!(profile.user_dir, PathBuf::from("/tmp/vscode-user"));
        assert_eq!(profile.shell.program(), "/bin/sh");
        assert_eq!(profile.shell.style(), ShellStyle::Posix);
    }
}
