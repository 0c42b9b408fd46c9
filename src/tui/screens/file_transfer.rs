//! File transfer submenu

use crate::actions::file_transfer;
use crate::error::Result;
use crate::tui::app::App;
use crate::tui::menu::{options, MenuSpec};
use crate::tui::screen::{run_leaf, Flow, Screen};

#[derive(Debug, Default)]
pub struct FileTransferMenu;

impl Screen for FileTransferMenu {
    fn spec(&self, _app: &App) -> Result<MenuSpec> {
        Ok(MenuSpec::new(
            "File Transfer",
            options(&[
                ("Croc", "Install croc for peer-to-peer transfers"),
                ("SFTP", "Enable SSH and show SFTP connection details"),
                ("Back", "Return to the main menu"),
            ]),
        )?
        .subtitle("Move files to and from this pod")
        .breadcrumbs(["Home", "File Transfer"])
        .help([
            "Croc: End-to-end encrypted transfers that work through NAT.",
            "SFTP: Use FileZilla, WinSCP or sftp with the root password.",
        ]))
    }

    fn on_select(&mut self, index: usize, app: &mut App) -> Result<Flow> {
        match index {
            0 => run_leaf(app, file_transfer::setup_croc),
            1 => run_leaf(app, file_transfer::setup_sftp),
            _ => Ok(Flow::Back),
        }
    }
}
