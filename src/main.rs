//! podrig - GPU pod setup tool
//!
//! Run without arguments to launch the interactive menu, pass action flags
//! to run those actions directly, or use `podrig config` to manage settings.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use podrig::cli::actions::run_actions;
use podrig::cli::commands::{Cli, Commands};
use podrig::cli::config;
use podrig::core::Config;
use podrig::error::Result;
use podrig::tui::App;

fn main() {
    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let mut cli = Cli::parse();

    if let Some(Commands::Config(args)) = cli.command.take() {
        return config::handle_config(args.command);
    }

    let config = Config::load()
        .unwrap_or_else(|e| {
            tracing::warn!("Using default configuration: {}", e);
            Config::default()
        })
        .with_overrides(cli.simple_ui, cli.workspace.clone());

    let mut app = App::new(config);
    // Ctrl-C only raises a flag; readers and commands turn it into "back"
    if let Err(e) = app.interrupt().install() {
        tracing::warn!("{}", e);
    }
    if cli.has_actions() {
        run_actions(&mut app, &cli)
    } else {
        app.run()
    }
}
