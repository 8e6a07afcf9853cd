use std::path::PathBuf;
use thiserror::Error;

/// Conditions that stop a collect or sync before anything is written.
#[derive(Debug, Error)]
pub enum PrerequisiteError {
    #[error("VS Code user directory not found: {}", .0.display())]
    UserDirMissing(PathBuf),

    #[error("VS Code CLI '{0}' is not available. Install VS Code and add 'code' to your PATH")]
    CliUnavailable(String),

    #[error("Configs directory not found: {}", .0.display())]
    ConfigsMissing(PathBuf),
}
