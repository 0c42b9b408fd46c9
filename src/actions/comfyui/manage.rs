//! Custom nodes, models and ComfyUI-Manager through comfy-cli

use secrecy::SecretString;

use crate::actions::comfyui::cli::{comfy_cmd, run};
use crate::actions::comfyui::settings::ComfyConfig;
use crate::core::process::Cmd;
use crate::error::{PodrigError, Result};
use crate::tui::app::App;
use crate::tui::theme::Tone;

/// Read-only node listings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeListing {
    All,
    Installed,
    NotInstalled,
}

impl NodeListing {
    fn args(self) -> [&'static str; 3] {
        match self {
            NodeListing::All => ["node", "show", "all"],
            NodeListing::Installed => ["node", "simple-show", "installed"],
            NodeListing::NotInstalled => ["node", "show", "not-installed"],
        }
    }

    fn status(self) -> &'static str {
        match self {
            NodeListing::All => "Fetching all custom nodes...",
            NodeListing::Installed => "Fetching installed nodes...",
            NodeListing::NotInstalled => "Fetching available nodes...",
        }
    }
}

pub fn list_nodes(app: &mut App, config: &ComfyConfig, listing: NodeListing) -> Result<()> {
    app.say(Tone::Info, listing.status());
    run(app, &comfy_cmd(config).args(listing.args()))
}

pub fn update_all_nodes(app: &mut App, config: &ComfyConfig) -> Result<()> {
    if !app.confirm("Update all custom nodes?", false) {
        return Err(PodrigError::Cancelled);
    }
    app.say(Tone::Info, "Updating all custom nodes...");
    run(app, &comfy_cmd(config).args(["node", "update", "all"]))
}

fn ask_required(app: &mut App, question: &str) -> Result<String> {
    let answer = app.ask(question, None).ok_or(PodrigError::Cancelled)?;
    let answer = answer.trim().to_string();
    if answer.is_empty() {
        return Err(PodrigError::Cancelled);
    }
    Ok(answer)
}

pub fn install_node(app: &mut App, config: &ComfyConfig) -> Result<()> {
    let name = ask_required(app, "Enter custom node name (e.g., ComfyUI-Impact-Pack)")?;
    app.say(Tone::Info, format!("Installing {}...", name));
    run(app, &comfy_cmd(config).args(["node", "install"]).arg(name))
}

pub fn save_snapshot(app: &mut App, config: &ComfyConfig) -> Result<()> {
    let name = app
        .ask("Enter snapshot name", Some("default"))
        .ok_or(PodrigError::Cancelled)?;
    let name = if name.trim().is_empty() {
        "default".to_string()
    } else {
        name.trim().to_string()
    };
    app.say(Tone::Info, format!("Saving snapshot: {}...", name));
    run(app, &comfy_cmd(config).args(["node", "save-snapshot"]).arg(name))
}

pub fn restore_snapshot(app: &mut App, config: &ComfyConfig) -> Result<()> {
    app.say(Tone::Info, "Available snapshots:");
    run(app, &comfy_cmd(config).args(["node", "snapshot-list"]))?;

    let name = ask_required(app, "Enter snapshot name to restore")?;
    if !app.confirm(&format!("Restore snapshot '{}'?", name), false) {
        return Err(PodrigError::Cancelled);
    }
    app.say(Tone::Info, format!("Restoring snapshot: {}...", name));
    run(app, &comfy_cmd(config).args(["node", "restore-snapshot"]).arg(name))
}

/// Hosts whose downloads accept an API token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelHost {
    Civitai,
    HuggingFace,
    Other,
}

impl ModelHost {
    pub fn from_url(url: &str) -> Self {
        let url = url.to_lowercase();
        if url.contains("civitai.com") {
            ModelHost::Civitai
        } else if url.contains("huggingface.co") {
            ModelHost::HuggingFace
        } else {
            ModelHost::Other
        }
    }

    fn token_flag(self) -> Option<&'static str> {
        match self {
            ModelHost::Civitai => Some("--set-civitai-api-token"),
            ModelHost::HuggingFace => Some("--set-hf-api-token"),
            ModelHost::Other => None,
        }
    }

    fn token_question(self) -> &'static str {
        match self {
            ModelHost::Civitai => "Enter CivitAI API token (required for most models, press Enter to skip)",
            _ => "Enter HuggingFace token (optional, press Enter to skip)",
        }
    }
}

/// `comfy model download` arguments
pub fn download_command(
    config: &ComfyConfig,
    url: &str,
    relative_path: Option<&str>,
    token: Option<&SecretString>,
) -> Cmd {
    let mut cmd = comfy_cmd(config).args(["model", "download", "--url", url]);
    if let Some(path) = relative_path {
        cmd = cmd.arg("--relative-path").arg(path);
    }
    if let (Some(flag), Some(token)) = (ModelHost::from_url(url).token_flag(), token) {
        cmd = cmd.arg(flag).secret_arg(token);
    }
    cmd
}

pub fn download_model(app: &mut App, config: &ComfyConfig) -> Result<()> {
    let url = ask_required(app, "Enter model URL (CivitAI, HuggingFace, etc.)")?;
    let relative_path = app
        .ask("Enter relative path (optional, press Enter to skip)", Some(""))
        .unwrap_or_default();
    let relative_path = Some(relative_path.trim()).filter(|p| !p.is_empty());

    let host = ModelHost::from_url(&url);
    let token = match host {
        ModelHost::Other => None,
        _ => app
            .ask(host.token_question(), Some(""))
            .filter(|t| !t.trim().is_empty())
            .map(|t| SecretString::from(t.trim().to_string())),
    };

    app.say(Tone::Info, format!("Downloading model from {}...", url));
    run(app, &download_command(config, &url, relative_path, token.as_ref()))
}

/// ComfyUI-Manager settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManagerAction {
    EnableGui,
    DisableGui,
    Clear,
}

impl ManagerAction {
    fn arg(self) -> &'static str {
        match self {
            ManagerAction::EnableGui => "enable-gui",
            ManagerAction::DisableGui => "disable-gui",
            ManagerAction::Clear => "clear",
        }
    }

    fn status(self) -> &'static str {
        match self {
            ManagerAction::EnableGui => "Enabling ComfyUI-Manager GUI...",
            ManagerAction::DisableGui => "Disabling ComfyUI-Manager GUI...",
            ManagerAction::Clear => "Clearing reserved startup action...",
        }
    }
}

pub fn manager(app: &mut App, config: &ComfyConfig, action: ManagerAction) -> Result<()> {
    app.say(Tone::Info, action.status());
    run(app, &comfy_cmd(config).args(["manager", action.arg()]))
}
