//! ComfyUI submenus

use crate::actions::comfyui::manage::{self, ManagerAction, NodeListing};
use crate::actions::comfyui::settings::ComfyConfig;
use crate::actions::comfyui::{self, active_label};
use crate::error::Result;
use crate::tui::app::App;
use crate::tui::menu::{options, MenuSpec};
use crate::tui::screen::{run_leaf, run_screen, Flow, Screen};

#[derive(Debug, Default)]
pub struct ComfyUiMenu;

impl Screen for ComfyUiMenu {
    fn spec(&self, app: &App) -> Result<MenuSpec> {
        Ok(MenuSpec::new(
            "ComfyUI",
            options(&[
                ("Configure ComfyUI", "Detect, list, select or add configurations"),
                ("Custom Nodes", "Install, update and snapshot custom nodes"),
                ("Models", "Download models by URL"),
                ("ComfyUI-Manager", "Toggle the Manager GUI"),
                ("Launch Server", "Start ComfyUI in the background on port 8188"),
                ("Stop Server", "Stop the background server"),
                ("Show Status", "Configuration details and server state"),
                ("Back", "Return to the main menu"),
            ]),
        )?
        .subtitle(active_label(app))
        .breadcrumbs(["Home", "ComfyUI"])
        .help([
            "Configure first: the active configuration is used by every other option.",
            "comfy-cli is installed into the configuration's virtualenv when needed.",
        ]))
    }

    fn on_select(&mut self, index: usize, app: &mut App) -> Result<Flow> {
        match index {
            0 => Ok(Flow::from_child(run_screen(app, &mut ConfigMenu))),
            1 => {
                let config = comfyui::prepare(app)?;
                Ok(Flow::from_child(run_screen(app, &mut NodesMenu { config })))
            }
            2 => {
                let config = comfyui::prepare(app)?;
                Ok(Flow::from_child(run_screen(app, &mut ModelsMenu { config })))
            }
            3 => {
                let config = comfyui::prepare(app)?;
                Ok(Flow::from_child(run_screen(app, &mut ManagerMenu { config })))
            }
            4 => run_leaf(app, comfyui::launch),
            5 => run_leaf(app, comfyui::stop),
            6 => run_leaf(app, comfyui::status),
            _ => Ok(Flow::Back),
        }
    }
}

/// Managing saved and detected configurations
#[derive(Debug, Default)]
pub struct ConfigMenu;

impl Screen for ConfigMenu {
    fn spec(&self, app: &App) -> Result<MenuSpec> {
        Ok(MenuSpec::new(
            "Configure ComfyUI",
            options(&[
                ("Auto-detect", "Look for known ComfyUI templates in the workspace"),
                ("List Configurations", "Show detected and saved configurations"),
                ("Select Configuration", "Choose the active configuration"),
                ("Add Custom Configuration", "Enter ComfyUI and venv paths by hand"),
                ("Back", "Return to the ComfyUI menu"),
            ]),
        )?
        .subtitle(active_label(app))
        .breadcrumbs(["Home", "ComfyUI", "Configure"]))
    }

    fn on_select(&mut self, index: usize, app: &mut App) -> Result<Flow> {
        match index {
            0 => run_leaf(app, comfyui::auto_detect),
            1 => run_leaf(app, comfyui::list),
            2 => run_leaf(app, comfyui::select),
            3 => run_leaf(app, comfyui::add_custom),
            _ => Ok(Flow::Back),
        }
    }
}

struct NodesMenu {
    config: ComfyConfig,
}

impl Screen for NodesMenu {
    fn spec(&self, _app: &App) -> Result<MenuSpec> {
        Ok(MenuSpec::new(
            "Custom Node Management",
            options(&[
                ("Show all custom nodes", "comfy node show all"),
                ("Show installed nodes", "comfy node simple-show installed"),
                ("Show available nodes", "comfy node show not-installed"),
                ("Update all nodes", "comfy node update all"),
                ("Install custom node", "comfy node install"),
                ("Save snapshot", "comfy node save-snapshot"),
                ("Restore snapshot", "comfy node restore-snapshot"),
                ("Back", ""),
            ]),
        )?
        .subtitle(format!("Active: {}", self.config.name))
        .breadcrumbs(["Home", "ComfyUI", "Custom Nodes"])
        .help([
            "Show all: List every known custom node repository.",
            "Installed: Show nodes currently installed in your setup.",
            "Available: Nodes that are known but not installed.",
            "Update all: Pull latest changes for all custom nodes.",
            "Install: Install a node by name (e.g., ComfyUI-Impact-Pack).",
            "Snapshots: Save or restore the custom_nodes folder state.",
        ]))
    }

    fn on_select(&mut self, index: usize, app: &mut App) -> Result<Flow> {
        let config = &self.config;
        match index {
            0 => run_leaf(app, |app| manage::list_nodes(app, config, NodeListing::All)),
            1 => run_leaf(app, |app| manage::list_nodes(app, config, NodeListing::Installed)),
            2 => run_leaf(app, |app| manage::list_nodes(app, config, NodeListing::NotInstalled)),
            3 => run_leaf(app, |app| manage::update_all_nodes(app, config)),
            4 => run_leaf(app, |app| manage::install_node(app, config)),
            5 => run_leaf(app, |app| manage::save_snapshot(app, config)),
            6 => run_leaf(app, |app| manage::restore_snapshot(app, config)),
            _ => Ok(Flow::Back),
        }
    }
}

struct ModelsMenu {
    config: ComfyConfig,
}

impl Screen for ModelsMenu {
    fn spec(&self, _app: &App) -> Result<MenuSpec> {
        Ok(MenuSpec::new(
            "Model Management",
            options(&[("Download model", "comfy model download"), ("Back", "")]),
        )?
        .subtitle(format!("Active: {}", self.config.name))
        .breadcrumbs(["Home", "ComfyUI", "Models"])
        .help([
            "Download model: Provide a CivitAI or HuggingFace URL.",
            "Relative path: Optional subfolder under models/ to place the file.",
            "Tokens: Set API tokens when prompted for protected downloads.",
        ]))
    }

    fn on_select(&mut self, index: usize, app: &mut App) -> Result<Flow> {
        match index {
            0 => run_leaf(app, |app| manage::download_model(app, &self.config)),
            _ => Ok(Flow::Back),
        }
    }
}

struct ManagerMenu {
    config: ComfyConfig,
}

impl Screen for ManagerMenu {
    fn spec(&self, _app: &App) -> Result<MenuSpec> {
        Ok(MenuSpec::new(
            "ComfyUI-Manager Management",
            options(&[
                ("Enable GUI", "comfy manager enable-gui"),
                ("Disable GUI", "comfy manager disable-gui"),
                ("Clear reserved startup action", "comfy manager clear"),
                ("Back", ""),
            ]),
        )?
        .subtitle(format!("Active: {}", self.config.name))
        .breadcrumbs(["Home", "ComfyUI", "Manager"])
        .help([
            "Enable GUI: Start ComfyUI-Manager web UI when ComfyUI launches.",
            "Disable GUI: Turn off Manager UI integration.",
            "Clear: Remove any reserved startup action for Manager.",
        ]))
    }

    fn on_select(&mut self, index: usize, app: &mut App) -> Result<Flow> {
        let action = match index {
            0 => ManagerAction::EnableGui,
            1 => ManagerAction::DisableGui,
            2 => ManagerAction::Clear,
            _ => return Ok(Flow::Back),
        };
        run_leaf(app, |app| manage::manager(app, &self.config, action))
    }
}
