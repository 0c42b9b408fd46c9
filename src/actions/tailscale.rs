//! Tailscale VPN client
//!
//! Pods have no systemd and no TUN device, so the daemon is started by hand
//! in userspace-networking mode with its state kept in the workspace.

use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use crate::core::process::{run_checked, run_interactive, Cmd};
use crate::error::{PodrigError, Result};
use crate::tui::app::App;
use crate::tui::theme::Tone;

const INSTALL_SCRIPT: &str = "curl -fsSL https://tailscale.com/install.sh | sh";
const STATE_DIR: &str = ".tailscale";
const DEFAULT_HOSTNAME: &str = "podrig";
const DAEMON_SOCKET: &str = "/var/run/tailscale/tailscaled.sock";
const STARTUP_POLLS: u32 = 20;
const STARTUP_POLL_INTERVAL: Duration = Duration::from_millis(250);

fn state_dir(app: &App) -> PathBuf {
    app.workspace_file(STATE_DIR)
}

/// `tailscaled` command line for a pod
pub fn daemon_command(state_dir: &Path) -> Cmd {
    Cmd::new("tailscaled")
        .arg("--tun=userspace-networking")
        .arg(format!("--state={}", state_dir.join("tailscaled.state").display()))
}

/// `tailscale up` reading the auth key from a file, so the key never shows
/// up in process listings or logs
pub fn up_command(key_file: &Path, hostname: &str) -> Cmd {
    Cmd::new("tailscale")
        .arg("up")
        .arg(format!("--auth-key=file:{}", key_file.display()))
        .arg(format!("--hostname={}", hostname))
}

/// Install, start and log in
pub fn connect(app: &mut App, auth_key: Option<SecretString>) -> Result<()> {
    app.heading("Tailscale Connect");
    ensure_installed(app)?;
    ensure_daemon(app)?;

    let key = match auth_key {
        Some(key) => key,
        None => {
            let answer = app
                .ask("Tailscale auth key (tskey-...)", None)
                .ok_or(PodrigError::Cancelled)?;
            SecretString::from(answer)
        }
    };
    if key.expose_secret().trim().is_empty() {
        return Err(PodrigError::InvalidInput(
            "A Tailscale auth key is required. Create one at https://login.tailscale.com/admin/settings/keys"
                .into(),
        ));
    }

    let hostname = app
        .env()
        .pod_id
        .clone()
        .unwrap_or_else(|| DEFAULT_HOSTNAME.to_string());

    let dir = state_dir(app);
    fs::create_dir_all(&dir)?;
    let key_file = write_key_file(&dir, &key)?;

    app.say(Tone::Info, format!("Connecting as '{}'...", hostname));
    let result = run_interactive(
        app.runner(),
        app.interrupt(),
        &up_command(key_file.path(), &hostname),
    );
    drop(key_file);
    result?;

    app.say(Tone::Success, "Connected to your tailnet.");
    tracing::info!(%hostname, "tailscale up");
    show_addresses(app);
    Ok(())
}

fn write_key_file(dir: &Path, key: &SecretString) -> Result<tempfile::NamedTempFile> {
    use std::io::Write;

    // NamedTempFile is created with mode 0600
    let mut file = tempfile::Builder::new().prefix("authkey").tempfile_in(dir)?;
    file.write_all(key.expose_secret().trim().as_bytes())?;
    file.flush()?;
    Ok(file)
}

fn ensure_installed(app: &mut App) -> Result<()> {
    if app.runner().which("tailscale").is_some() {
        app.say(Tone::Success, "Tailscale is already installed.");
        return Ok(());
    }

    app.say(Tone::Warning, "Tailscale not found. Installing...");
    run_interactive(app.runner(), app.interrupt(), &Cmd::shell(INSTALL_SCRIPT)).map_err(|e| match e {
        PodrigError::Cancelled => e,
        other => PodrigError::action("Tailscale installation", other.to_string()),
    })?;

    if app.runner().which("tailscale").is_none() {
        return Err(PodrigError::action(
            "Tailscale installation",
            "the install script finished but `tailscale` is not on PATH",
        ));
    }
    app.say(Tone::Success, "Tailscale installed.");
    Ok(())
}

fn daemon_running(app: &App) -> bool {
    app.runner()
        .output(&Cmd::new("pgrep").args(["-x", "tailscaled"]))
        .map(|out| out.success)
        .unwrap_or(false)
}

fn ensure_daemon(app: &mut App) -> Result<()> {
    if daemon_running(app) {
        app.say(Tone::Success, "tailscaled is already running.");
        return Ok(());
    }

    let dir = state_dir(app);
    fs::create_dir_all(&dir)?;
    let log = dir.join("tailscaled.log");

    app.say(Tone::Info, "Starting tailscaled (userspace networking)...");
    let pid = app.runner().spawn_detached(&daemon_command(&dir), &log)?;
    tracing::info!(pid, log = %log.display(), "tailscaled started");

    let socket = Path::new(DAEMON_SOCKET);
    for _ in 0..STARTUP_POLLS {
        if socket.exists() {
            break;
        }
        thread::sleep(STARTUP_POLL_INTERVAL);
    }
    if !socket.exists() {
        tracing::debug!("tailscaled socket not seen yet; continuing");
    }

    app.say(
        Tone::Success,
        format!("tailscaled started (pid {}, log {}).", pid, log.display()),
    );
    Ok(())
}

fn show_addresses(app: &mut App) {
    match run_checked(app.runner(), &Cmd::new("tailscale").args(["ip", "-4"])) {
        Ok(out) => {
            let ip = out.stdout.trim().to_string();
            if !ip.is_empty() {
                app.field("Tailscale IPv4", ip);
            }
        }
        Err(e) => tracing::debug!("tailscale ip failed: {}", e),
    }
}

/// Print connection status and addresses
pub fn status(app: &mut App) -> Result<()> {
    app.heading("Tailscale Status");
    if app.runner().which("tailscale").is_none() {
        return Err(PodrigError::missing(
            "Tailscale",
            "Choose 'Connect' first to install and start it.",
        ));
    }

    let out = app
        .runner()
        .output(&Cmd::new("tailscale").arg("status"))?;
    if out.success {
        app.echo(&out.stdout);
    } else {
        app.say(Tone::Warning, "Not connected.");
        app.echo(out.error_detail().as_str());
    }
    show_addresses(app);
    Ok(())
}

/// Log out of the tailnet
pub fn disconnect(app: &mut App) -> Result<()> {
    app.heading("Tailscale Disconnect");
    if app.runner().which("tailscale").is_none() {
        app.say(Tone::Warning, "Tailscale is not installed; nothing to disconnect.");
        return Ok(());
    }

    run_interactive(app.runner(), app.interrupt(), &Cmd::new("tailscale").arg("down"))?;
    app.say(Tone::Success, "Disconnected.");
    Ok(())
}
