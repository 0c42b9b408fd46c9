//! Tailscale submenu

use crate::actions::tailscale;
use crate::error::Result;
use crate::tui::app::App;
use crate::tui::menu::{options, MenuSpec};
use crate::tui::screen::{run_leaf, Flow, Screen};

#[derive(Debug, Default)]
pub struct VpnMenu;

impl Screen for VpnMenu {
    fn spec(&self, _app: &App) -> Result<MenuSpec> {
        Ok(MenuSpec::new(
            "VPN (Tailscale)",
            options(&[
                ("Connect", "Install Tailscale, start the daemon and log in"),
                ("Status", "Show tailnet status and addresses"),
                ("Disconnect", "Log this pod out of the tailnet"),
                ("Back", "Return to the main menu"),
            ]),
        )?
        .breadcrumbs(["Home", "VPN"])
        .help([
            "Connect: Needs an auth key from the Tailscale admin console.",
            "The daemon runs in userspace-networking mode; no TUN device is used.",
        ]))
    }

    fn on_select(&mut self, index: usize, app: &mut App) -> Result<Flow> {
        match index {
            0 => run_leaf(app, |app| tailscale::connect(app, None)),
            1 => run_leaf(app, tailscale::status),
            2 => run_leaf(app, tailscale::disconnect),
            _ => Ok(Flow::Back),
        }
    }
}
