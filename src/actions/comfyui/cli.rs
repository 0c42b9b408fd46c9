//! comfy-cli inside a configuration's virtualenv

use crate::actions::comfyui::detect::{comfy_exe, python_exe};
use crate::actions::comfyui::settings::ComfyConfig;
use crate::core::process::{run_checked, Cmd};
use crate::error::{PodrigError, Result};
use crate::tui::app::App;
use crate::tui::theme::Tone;

const PACKAGE: &str = "comfy-cli";

/// `comfy` with the flags every invocation needs
pub fn comfy_cmd(config: &ComfyConfig) -> Cmd {
    Cmd::new(comfy_exe(&config.venv_path).to_string_lossy())
        .args(["--skip-prompt", "--no-enable-telemetry"])
}

/// Install comfy-cli into the venv if needed and point it at the ComfyUI
/// directory
pub fn ensure_cli(app: &mut App, config: &ComfyConfig) -> Result<()> {
    let python = python_exe(&config.venv_path).ok_or_else(|| {
        PodrigError::missing(
            format!("Python in {}", config.venv_path.display()),
            "Check the virtual environment path of this configuration.",
        )
    })?;
    let pip = |verb: &str| {
        Cmd::new(python.to_string_lossy()).args(["-m", "pip", verb, PACKAGE])
    };

    let installed = app
        .runner()
        .output(&pip("show"))
        .map(|out| out.success)
        .unwrap_or(false);
    if installed {
        app.say(Tone::Success, "comfy-cli is already installed");
    } else {
        app.say(Tone::Info, "Installing comfy-cli...");
        run_checked(app.runner(), &pip("install"))
            .map_err(|e| PodrigError::action("comfy-cli installation", e.to_string()))?;
        app.say(Tone::Success, "comfy-cli installed successfully");
    }

    app.say(Tone::Info, "Setting default ComfyUI path...");
    let set_default = comfy_cmd(config)
        .arg("set-default")
        .arg(config.comfyui_path.to_string_lossy());
    run_checked(app.runner(), &set_default)
        .map_err(|e| PodrigError::action("Setting the default ComfyUI path", e.to_string()))?;
    app.say(Tone::Success, "Default ComfyUI path set successfully");
    Ok(())
}

/// Run a comfy command and show what it printed
pub fn run(app: &mut App, cmd: &Cmd) -> Result<()> {
    let out = run_checked(app.runner(), cmd)?;
    tracing::info!(command = %cmd, "comfy command finished");
    app.echo(&out.stdout);
    Ok(())
}
