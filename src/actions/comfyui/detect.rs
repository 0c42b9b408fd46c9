//! Finding and checking ComfyUI installations

use std::path::{Path, PathBuf};

use crate::actions::comfyui::settings::{ComfyConfig, Settings, TemplateKind};

fn config(name: &str, kind: TemplateKind, comfyui: PathBuf, venv: PathBuf) -> ComfyConfig {
    ComfyConfig {
        name: name.to_string(),
        kind,
        comfyui_path: comfyui,
        venv_path: venv,
        detected: true,
    }
}

/// Known templates present under the workspace, in priority order
pub fn detect_templates(workspace: &Path) -> Vec<ComfyConfig> {
    let mut found = Vec::new();
    let comfyui = workspace.join("ComfyUI");

    let uploader = workspace.join("logs").join("runpod-uploader.log").exists() && comfyui.exists();
    if uploader {
        found.push(config(
            "Uploader Template",
            TemplateKind::Uploader,
            comfyui.clone(),
            comfyui.join("venv"),
        ));
    }

    let dot_venv = comfyui.join(".venv");
    if comfyui.exists() && dot_venv.exists() {
        found.push(config(
            "Standard ComfyUI (.venv)",
            TemplateKind::StandardVenv,
            comfyui.clone(),
            dot_venv,
        ));
    } else if comfyui.exists() && !uploader {
        found.push(config(
            "Standard ComfyUI",
            TemplateKind::Standard,
            comfyui.clone(),
            comfyui.join("venv"),
        ));
    }

    let slim = workspace.join("madapps").join("ComfyUI");
    if slim.exists() {
        found.push(config(
            "Slim Template",
            TemplateKind::Slim,
            slim.clone(),
            slim.join(".venv"),
        ));
    }

    found
}

/// Python interpreter inside a virtualenv
pub fn python_exe(venv: &Path) -> Option<PathBuf> {
    [venv.join("bin").join("python"), venv.join("Scripts").join("python.exe")]
        .into_iter()
        .find(|p| p.exists())
}

/// `comfy` entry point inside a virtualenv; the Unix path when neither exists
pub fn comfy_exe(venv: &Path) -> PathBuf {
    let unix = venv.join("bin").join("comfy");
    let windows = venv.join("Scripts").join("comfy.exe");
    if !unix.exists() && windows.exists() {
        windows
    } else {
        unix
    }
}

/// Problems that would stop comfy-cli from working; empty when valid
pub fn validate(config: &ComfyConfig) -> Vec<String> {
    let mut issues = Vec::new();
    let comfyui = &config.comfyui_path;
    let venv = &config.venv_path;

    if !comfyui.exists() {
        issues.push(format!("ComfyUI directory not found: {}", comfyui.display()));
    } else {
        if !comfyui.join("main.py").exists() {
            issues.push("main.py not found in ComfyUI directory".to_string());
        }
        for dir in ["models", "custom_nodes"] {
            if !comfyui.join(dir).exists() {
                issues.push(format!("{} directory not found", dir));
            }
        }
    }

    if !venv.exists() {
        issues.push(format!("Virtual environment not found: {}", venv.display()));
    } else if python_exe(venv).is_none() {
        issues.push("Python executable not found in virtual environment".to_string());
    }

    issues
}

/// The saved `last_used` configuration, else the first detected template
pub fn current(settings: &Settings, detected: &[ComfyConfig]) -> Option<ComfyConfig> {
    settings
        .last_used_config()
        .or_else(|| detected.first())
        .cloned()
}

/// Detected templates followed by saved configurations with new names
pub fn all_configurations(settings: &Settings, detected: &[ComfyConfig]) -> Vec<ComfyConfig> {
    let mut all = detected.to_vec();
    for saved in &settings.configurations {
        if !detected.iter().any(|d| d.name == saved.name) {
            all.push(saved.clone());
        }
    }
    all
}
