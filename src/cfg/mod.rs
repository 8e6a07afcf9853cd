use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// File name looked up under the project root when `--config` is not given.
pub const CONFIG_FILE_NAME: &str = "codesnap.toml";

/// Directory under the project root that holds the snapshots.
pub const DEFAULT_CONFIGS_DIR: &str = "Configs";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub editor: EditorConfig,

    #[serde(default)]
    pub tracked: TrackedConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Snapshot store location. Relative paths are resolved against the project root.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub configs_dir: Option<String>,

    /// Open the snapshot (collect) or user directory (sync) in the file browser when done
    #[serde(default = "default_open_after")]
    pub open_after: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EditorConfig {
    /// Overrides the platform's VS Code user directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_dir: Option<String>,

    /// Editor CLI program; skips PATH probing when set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cli: Option<String>,

    /// Shell used to run the editor CLI
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shell: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackedConfig {
    #[serde(default = "default_tracked_files")]
    pub files: Vec<String>,

    #[serde(default = "default_tracked_directories")]
    pub directories: Vec<String>,

    /// Extensions (without the dot) re-encoded to UTF-8 while copying directories
    #[serde(default = "default_reencode_extensions")]
    pub reencode_extensions: Vec<String>,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        GeneralConfig {
            configs_dir: None,
            open_after: default_open_after(),
        }
    }
}

impl Default for TrackedConfig {
    fn default() -> Self {
        TrackedConfig {
            files: default_tracked_files(),
            directories: default_tracked_directories(),
            reencode_extensions: default_reencode_extensions(),
        }
    }
}

fn default_open_after() -> bool {
    true
}

fn default_tracked_files() -> Vec<String> {
    vec!["settings.json".to_string(), "keybindings.json".to_string()]
}

fn default_tracked_directories() -> Vec<String> {
    vec!["snippets".to_string()]
}

fn default_reencode_extensions() -> Vec<String> {
    vec![
        "json".to_string(),
        "code-snippets".to_string(),
        "txt".to_string(),
    ]
}

impl Config {
    /// Where snapshots live for the given project root.
    pub fn configs_dir(&self, project_root: &Path) -> PathBuf {
        match &self.general.configs_dir {
            Some(dir) => {
                let expanded = expand_path(dir);
                if expanded.is_absolute() {
                    expanded
                } else {
                    project_root.join(expanded)
                }
            }
            None => project_root.join(DEFAULT_CONFIGS_DIR),
        }
    }

    pub fn user_dir_override(&self) -> Option<PathBuf> {
        self.editor.user_dir.as_deref().map(expand_path)
    }
}

/// Expand a leading `~` to the home directory.
pub fn expand_path(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).to_string())
}

pub fn load(config_path: &Path) -> Result<Config> {
    if !config_path.exists() {
        anyhow::bail!("Config not found at {}", config_path.display());
    }

    let contents = fs::read_to_string(config_path)
        .with_context(|| format!("Failed to read config file {}", config_path.display()))?;
    let config: Config = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse config file {}", config_path.display()))?;

    Ok(config)
}

/// Load the config when the file exists; a missing file means defaults.
pub fn load_or_default(config_path: &Path) -> Result<Config> {
    if config_path.exists() {
        load(config_path)
    } else {
        Ok(Config::default())
    }
}
