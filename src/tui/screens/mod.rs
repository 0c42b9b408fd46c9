//! Menu screens
//!
//! The tree is `MainMenu` at the root with one child screen per feature
//! area. Leaf options call straight into `crate::actions`.

pub mod comfyui;
pub mod file_transfer;
pub mod vpn;

pub use comfyui::ComfyUiMenu;
pub use file_transfer::FileTransferMenu;
pub use vpn::VpnMenu;

use crate::actions::{pod_info, ssh};
use crate::error::Result;
use crate::tui::app::App;
use crate::tui::menu::{options, MenuSpec};
use crate::tui::screen::{run_leaf, run_screen, Flow, Screen};

/// Root of the menu tree
#[derive(Debug, Default)]
pub struct MainMenu;

impl Screen for MainMenu {
    fn spec(&self, _app: &App) -> Result<MenuSpec> {
        Ok(MenuSpec::new(
            "podrig",
            options(&[
                ("SSH Setup", "Configure SSH server and create connection scripts"),
                ("Pod Information", "Display pod environment information"),
                ("File Transfer", "Set up file transfer with croc or SFTP"),
                ("VPN (Tailscale)", "Join this pod to your tailnet"),
                ("ComfyUI", "Configure and manage ComfyUI"),
                ("Exit", "Exit the application"),
            ]),
        )?
        .subtitle("GPU Pod Setup Tool")
        .breadcrumbs(["Home"])
        .help([
            "SSH Setup: Enable root login over SSH and write connection scripts.",
            "Pod Information: GPU, CUDA and network details of this pod.",
            "File Transfer: Install croc or enable SFTP.",
            "VPN: Connect to Tailscale without a TUN device.",
            "ComfyUI: Detect installs, manage nodes and models, run the server.",
        ]))
    }

    fn on_select(&mut self, index: usize, app: &mut App) -> Result<Flow> {
        match index {
            0 => run_leaf(app, ssh::setup),
            1 => run_leaf(app, pod_info::show),
            2 => Ok(Flow::from_child(run_screen(app, &mut FileTransferMenu))),
            3 => Ok(Flow::from_child(run_screen(app, &mut VpnMenu))),
            4 => Ok(Flow::from_child(run_screen(app, &mut ComfyUiMenu))),
            _ => Ok(Flow::Exit),
        }
    }
}
