//! Flag-driven actions
//!
//! Each action flag maps to one menu leaf (or submenu). Flags run in a fixed
//! order and the first failure stops the run.

use secrecy::SecretString;

use crate::actions::{file_transfer, pod_info, ssh, tailscale};
use crate::cli::commands::Cli;
use crate::error::Result;
use crate::tui::app::App;
use crate::tui::screen::run_screen;
use crate::tui::screens::{ComfyUiMenu, FileTransferMenu, VpnMenu};

/// Run every action flag set on `cli`
pub fn run_actions(app: &mut App, cli: &Cli) -> Result<()> {
    if cli.setup_ssh {
        ssh::setup(app)?;
    }
    if cli.info {
        pod_info::show(app)?;
    }
    if cli.install_croc {
        file_transfer::install_croc(app)?;
    }
    if cli.setup_sftp {
        file_transfer::setup_sftp(app)?;
    }
    if cli.file_transfer {
        run_screen(app, &mut FileTransferMenu);
    }
    if cli.tailscale {
        run_screen(app, &mut VpnMenu);
    }
    if let Some(key) = &cli.tailscale_up {
        tailscale::connect(app, Some(SecretString::from(key.clone())))?;
    }
    if cli.comfyui {
        run_screen(app, &mut ComfyUiMenu);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::process::MockCommandRunner;
    use crate::core::{Config, PodEnvironment};
    use crate::error::PodrigError;
    use crate::tui::prompt::ScriptedPrompt;
    use crate::tui::sink::MemorySink;

    fn app(sink: &MemorySink) -> App {
        App::new(Config::default())
            .with_output(sink.clone())
            .with_prompt(ScriptedPrompt::default())
            .with_runner(MockCommandRunner::new())
            .with_env(PodEnvironment::default())
    }

    #[test]
    fn test_info_flag() {
        let sink = MemorySink::new();
        let cli = Cli {
            info: true,
            ..Cli::default()
        };
        run_actions(&mut app(&sink), &cli).unwrap();
        assert!(sink.text().contains("Pod Information"));
    }

    #[test]
    fn test_failure_stops_later_flags() {
        let sink = MemorySink::new();
        let cli = Cli {
            setup_ssh: true,
            info: true,
            ..Cli::default()
        };
        let err = run_actions(&mut app(&sink), &cli).unwrap_err();
        assert!(matches!(err, PodrigError::ConfigurationMissing { .. }));
        assert!(!sink.text().contains("Pod Information"));
    }
}
