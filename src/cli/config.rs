//! Configuration CLI command handlers

use std::path::{Path, PathBuf};

use crate::cli::commands::{ConfigCommand, ConfigKey};
use crate::core::config::Config;
use crate::error::{PodrigError, Result};

/// Handle configuration commands
pub fn handle_config(command: ConfigCommand) -> Result<()> {
    let path = Config::config_path()?;
    let message = handle_config_at(command, &path)?;
    println!("{}", message);
    Ok(())
}

/// Apply a configuration command to the file at `path`; returns what to print
pub fn handle_config_at(command: ConfigCommand, path: &Path) -> Result<String> {
    match command {
        ConfigCommand::Set { key, value } => handle_set(path, key, &value),
        ConfigCommand::Get { key } => handle_get(path, key),
        ConfigCommand::Remove { key } => handle_remove(path, key),
    }
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(PodrigError::InvalidInput(format!(
            "Invalid value '{}'. Use true or false.",
            value
        ))),
    }
}

/// Handle setting a configuration value
fn handle_set(path: &Path, key: ConfigKey, value: &str) -> Result<String> {
    let mut config = Config::load_from(path)?;
    let message = match key {
        ConfigKey::SimpleUi => {
            config.simple_ui = parse_bool(value)?;
            format!("Simple UI set to: {}", config.simple_ui)
        }
        ConfigKey::Workspace => {
            if value.trim().is_empty() {
                return Err(PodrigError::InvalidInput(
                    "Workspace directory cannot be empty.".into(),
                ));
            }
            config.workspace_dir = PathBuf::from(value.trim());
            format!("Workspace set to: {}", config.workspace_dir.display())
        }
    };
    config.save_to(path)?;
    tracing::info!(?key, "configuration updated");
    Ok(message)
}

/// Handle getting a configuration value
fn handle_get(path: &Path, key: ConfigKey) -> Result<String> {
    let config = Config::load_from(path)?;
    Ok(match key {
        ConfigKey::SimpleUi => format!("Simple UI: {}", config.simple_ui),
        ConfigKey::Workspace => format!("Workspace: {}", config.workspace_dir.display()),
    })
}

/// Handle removing a configuration value
fn handle_remove(path: &Path, key: ConfigKey) -> Result<String> {
    let mut config = Config::load_from(path)?;
    let defaults = Config::default();
    let message = match key {
        ConfigKey::SimpleUi => {
            config.simple_ui = defaults.simple_ui;
            format!("Simple UI reset to default: {}", config.simple_ui)
        }
        ConfigKey::Workspace => {
            config.workspace_dir = defaults.workspace_dir;
            format!(
                "Workspace reset to default: {}",
                config.workspace_dir.display()
            )
        }
    };
    config.save_to(path)?;
    Ok(message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_remove() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let msg = handle_config_at(
            ConfigCommand::Set {
                key: ConfigKey::Workspace,
                value: "/data".into(),
            },
            &path,
        )
        .unwrap();
        assert_eq!(msg, "Workspace set to: /data");
        assert_eq!(
            handle_config_at(ConfigCommand::Get { key: ConfigKey::Workspace }, &path).unwrap(),
            "Workspace: /data"
        );

        handle_config_at(
            ConfigCommand::Set {
                key: ConfigKey::SimpleUi,
                value: "yes".into(),
            },
            &path,
        )
        .unwrap();
        assert!(Config::load_from(&path).unwrap().simple_ui);

        handle_config_at(ConfigCommand::Remove { key: ConfigKey::Workspace }, &path).unwrap();
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.workspace_dir, Config::default().workspace_dir);
        assert!(config.simple_ui);
    }

    #[test]
    fn test_invalid_bool() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let err = handle_config_at(
            ConfigCommand::Set {
                key: ConfigKey::SimpleUi,
                value: "maybe".into(),
            },
            &path,
        )
        .unwrap_err();
        assert!(matches!(err, PodrigError::InvalidInput(_)));
        assert!(!path.exists());
    }
}
