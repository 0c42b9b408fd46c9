//! CLI command definitions using clap
//!
//! Defines the command structure for the `podrig` CLI tool.

use std::path::PathBuf;

use clap::builder::BoolishValueParser;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};

/// podrig - GPU pod setup tool
///
/// Interactive menus for SSH, file transfer, Tailscale and ComfyUI on a
/// rented GPU pod. Run without arguments to launch the menu; pass action
/// flags to run those actions directly and exit.
#[derive(Parser, Debug, Default)]
#[command(name = "podrig", version, about, long_about = None)]
pub struct Cli {
    /// Set up the SSH server and root password
    #[arg(long)]
    pub setup_ssh: bool,

    /// Show pod information
    #[arg(long)]
    pub info: bool,

    /// Install croc for file transfers
    #[arg(long)]
    pub install_croc: bool,

    /// Enable SFTP access (sets up SSH)
    #[arg(long)]
    pub setup_sftp: bool,

    /// Open the file transfer menu
    #[arg(long)]
    pub file_transfer: bool,

    /// Open the Tailscale menu
    #[arg(long)]
    pub tailscale: bool,

    /// Connect to Tailscale with the given auth key
    #[arg(long, value_name = "AUTH_KEY")]
    pub tailscale_up: Option<String>,

    /// Open the ComfyUI menu
    #[arg(long)]
    pub comfyui: bool,

    /// Always read whole lines instead of single keys
    #[arg(
        long,
        env = "PODRIG_SIMPLE_UI",
        action = ArgAction::SetTrue,
        value_parser = BoolishValueParser::new()
    )]
    pub simple_ui: bool,

    /// Directory for generated files and settings
    #[arg(long, env = "PODRIG_WORKSPACE", value_name = "DIR")]
    pub workspace: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Whether any action flag was given
    pub fn has_actions(&self) -> bool {
        self.setup_ssh
            || self.info
            || self.install_croc
            || self.setup_sftp
            || self.file_transfer
            || self.tailscale
            || self.tailscale_up.is_some()
            || self.comfyui
    }
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage configuration
    Config(ConfigArgs),
}

// ─────────────────────────────────────────────────────────────────────────────
// Config Commands
// ─────────────────────────────────────────────────────────────────────────────

/// Configuration commands
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Set a configuration value
    Set {
        /// Configuration key
        key: ConfigKey,

        /// Configuration value
        value: String,
    },

    /// Get a configuration value
    Get {
        /// Configuration key
        key: ConfigKey,
    },

    /// Reset a configuration value to its default
    Remove {
        /// Configuration key
        key: ConfigKey,
    },
}

/// Available configuration keys
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ConfigKey {
    /// Force line-buffered menus
    #[value(name = "simple-ui")]
    SimpleUi,

    /// Workspace directory
    #[value(name = "workspace")]
    Workspace,
}
