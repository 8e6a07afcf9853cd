use anyhow::{Context, Result};
use std::path::Path;
use std::process::{Output, Stdio};

use super::{ExtensionListing, ExtensionManager};
use crate::cfg::Config;
use crate::platform::{PlatformKind, PlatformProfile, Shell};
use crate::ui;

pub const DEFAULT_CLI: &str = "code";

/// Where VS Code's CLI lives on macOS when `code` is not on PATH, in probe order.
pub const MACOS_FALLBACK_PATHS: [&str; 3] = [
    "/opt/homebrew/bin/code",
    "/usr/local/bin/code",
    "/Applications/Visual Studio Code.app/Contents/Resources/app/bin/code",
];

/// VS Code's command line interface, invoked through the platform shell.
#[derive(Debug, Clone)]
pub struct CodeCli {
    program: String,
    shell: Shell,
}

impl CodeCli {
    pub fn new(program: impl Into<String>, shell: Shell) -> Self {
        CodeCli {
            program: program.into(),
            shell,
        }
    }

    /// Pick the CLI for this platform, honoring `[editor] cli`.
    pub fn resolve(profile: &PlatformProfile, config: &Config) -> Self {
        let program = resolve_cli(
            profile.kind,
            config.editor.cli.as_deref(),
            || probe_on_path(&profile.shell, DEFAULT_CLI),
            |path| path.is_file(),
        );
        CodeCli::new(program, profile.shell.clone())
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// `code --version` as one line, or `None` when the CLI cannot be run.
    pub fn version(&self) -> Option<String> {
        let output = self.run(&["--version"]).ok()?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        let lines: Vec<&str> = stdout
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect();
        if lines.is_empty() {
            None
        } else {
            Some(lines.join(" | "))
        }
    }

    fn command_line(&self, args: &[&str]) -> String {
        let mut words = vec![self.shell.quote(&self.program).into_owned()];
        words.extend(args.iter().map(|a| self.shell.quote(a).into_owned()));
        words.join(" ")
    }

    /// Run the CLI to completion with both pipes drained.
    fn run(&self, args: &[&str]) -> Result<Output> {
        let line = self.command_line(args);
        self.shell
            .command(&line)
            .stdin(Stdio::null())
            .output()
            .with_context(|| format!("Failed to run '{}' via {}", line, self.shell.program()))
    }
}

impl ExtensionManager for CodeCli {
    fn name(&self) -> &str {
        &self.program
    }

    fn list(&self) -> Result<ExtensionListing> {
        let output = self.run(&["--list-extensions"])?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        if !output.status.success() {
            anyhow::bail!(
                "'{} --list-extensions' exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            );
        }
        if !stderr.trim().is_empty() {
            ui::warn(stderr.trim());
        }

        Ok(ExtensionListing::new(output.stdout))
    }

    fn install(&self, id: &str) -> Result<()> {
        let output = self.run(&["--install-extension", id, "--force"])?;
        if !output.status.success() {
            anyhow::bail!(
                "exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(())
    }
}

/// Decide which program to call as the editor CLI.
///
/// A configured CLI always wins. On macOS, `code` is used when it is on
/// PATH, otherwise the first existing entry of [`MACOS_FALLBACK_PATHS`].
/// Everywhere else, and when nothing is found, it is plain `code`.
pub fn resolve_cli(
    kind: PlatformKind,
    configured: Option<&str>,
    on_path: impl FnOnce() -> bool,
    exists: impl Fn(&Path) -> bool,
) -> String {
    if let Some(cli) = configured {
        return crate::cfg::expand_path(cli).to_string_lossy().into_owned();
    }

    if kind == PlatformKind::MacOs && !on_path() {
        if let Some(found) = MACOS_FALLBACK_PATHS
            .iter()
            .find(|candidate| exists(Path::new(candidate)))
        {
            return found.to_string();
        }
    }

    DEFAULT_CLI.to_string()
}

/// Ask the shell whether `program` resolves on PATH.
pub fn probe_on_path(shell: &Shell, program: &str) -> bool {
    let line = format!(
        "command -v {} >/dev/null 2>&1 && echo OK || echo NO",
        shell.quote(program)
    );
    match shell
        .command(&line)
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output()
    {
        Ok(output) => probe_says_ok(&String::from_utf8_lossy(&output.stdout)),
        Err(_) => false,
    }
}

fn probe_says_ok(stdout: &str) -> bool {
    stdout.trim().ends_with("OK")
}
