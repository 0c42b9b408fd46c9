//! Saved ComfyUI configurations
//!
//! One JSON file in the workspace, read whole and rewritten whole on every
//! save.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{PodrigError, Result};

pub const SETTINGS_FILE: &str = "podrig_comfyui_settings.json";

/// Where a configuration came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateKind {
    /// Template that ships the pod uploader (`logs/runpod-uploader.log`)
    Uploader,
    /// `ComfyUI` with a `.venv` inside
    StandardVenv,
    /// `ComfyUI` with a `venv` inside
    Standard,
    /// `madapps/ComfyUI` slim template
    Slim,
    /// Entered by the user
    Custom,
}

impl fmt::Display for TemplateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TemplateKind::Uploader => "uploader",
            TemplateKind::StandardVenv => "standard_venv",
            TemplateKind::Standard => "standard",
            TemplateKind::Slim => "slim",
            TemplateKind::Custom => "custom",
        };
        f.write_str(s)
    }
}

/// A ComfyUI installation and the virtualenv it runs in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComfyConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: TemplateKind,
    pub comfyui_path: PathBuf,
    pub venv_path: PathBuf,
    /// Found by template detection rather than entered by hand
    #[serde(default)]
    pub detected: bool,
}

/// Contents of the settings file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub configurations: Vec<ComfyConfig>,
    #[serde(default)]
    pub last_used: Option<String>,
}

impl Settings {
    /// Read the settings; a missing or unreadable file gives empty settings
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match fs::read_to_string(path)
            .map_err(PodrigError::from)
            .and_then(|s| serde_json::from_str::<Settings>(&s).map_err(PodrigError::from))
        {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!("Ignoring unreadable settings file {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Rewrite the whole file
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    pub fn find(&self, name: &str) -> Option<&ComfyConfig> {
        self.configurations.iter().find(|c| c.name == name)
    }

    /// The configuration named by `last_used`, if it is saved
    pub fn last_used_config(&self) -> Option<&ComfyConfig> {
        self.last_used.as_deref().and_then(|name| self.find(name))
    }

    /// Add or replace by name
    pub fn upsert(&mut self, config: ComfyConfig) {
        self.configurations.retain(|c| c.name != config.name);
        self.configurations.push(config);
    }
}
