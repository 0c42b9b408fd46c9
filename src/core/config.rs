//! Application configuration management
//!
//! Handles loading and saving user settings:
//! - Forced simple (line-buffered) UI mode
//! - Workspace directory where generated files and settings live

use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::{PodrigError, Result};

/// Workspace directory used on pods unless overridden
pub const DEFAULT_WORKSPACE: &str = "/workspace";

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Always use line-buffered input, even on a real terminal
    #[serde(default)]
    pub simple_ui: bool,

    /// Directory for generated scripts, passwords and settings
    #[serde(default = "default_workspace")]
    pub workspace_dir: PathBuf,
}

fn default_workspace() -> PathBuf {
    PathBuf::from(DEFAULT_WORKSPACE)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            simple_ui: false,
            workspace_dir: default_workspace(),
        }
    }
}

impl Config {
    /// Load configuration from file, or create default if not exists
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from an explicit path
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)?;
            let config: Config = toml::from_str(&contents)?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    /// Save configuration to an explicit path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;

        Ok(())
    }

    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        let project_dirs = ProjectDirs::from("com", "podrig", "podrig")
            .ok_or_else(|| PodrigError::Config("Could not determine config directory".into()))?;

        Ok(project_dirs.config_dir().join("config.toml"))
    }

    /// Apply command-line and environment overrides on top of the file values
    pub fn with_overrides(mut self, simple_ui: bool, workspace: Option<PathBuf>) -> Self {
        self.simple_ui |= simple_ui;
        if let Some(dir) = workspace {
            self.workspace_dir = dir;
        }
        self
    }

    /// Path of a file inside the workspace
    pub fn workspace_file(&self, name: &str) -> PathBuf {
        self.workspace_dir.join(name)
    }
}
