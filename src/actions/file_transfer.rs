//! File transfer setup: croc and SFTP

use std::path::{Path, PathBuf};

use crate::actions::{mask_secret, ssh};
use crate::core::process::{run_checked, Cmd};
use crate::error::{PodrigError, Result};
use crate::tui::app::App;
use crate::tui::theme::Tone;

const CROC_RELEASES: &str = "https://github.com/schollz/croc/releases/latest/download";
const CROC_DEST: &str = "/usr/local/bin/croc";

/// Release asset architecture for a Rust target architecture
pub fn croc_arch(arch: &str) -> &'static str {
    match arch {
        "x86_64" => "amd64",
        "aarch64" => "arm64",
        "arm" => "arm",
        "x86" => "386",
        _ => "amd64",
    }
}

pub fn croc_download_url(arch: &str) -> String {
    format!("{}/croc_Linux_{}.tar.gz", CROC_RELEASES, croc_arch(arch))
}

/// Install croc and show how to use it
pub fn setup_croc(app: &mut App) -> Result<()> {
    app.heading("Croc File Transfer Setup");
    install_croc_to(app, std::env::consts::ARCH, Path::new(CROC_DEST))?;

    app.blank();
    app.say(Tone::Success, "Croc Setup Complete!");
    app.section("How to use croc for file transfers:");
    let rows = [
        ["Send files", "croc send <file/folder>", "Send files to another device"],
        ["Receive files", "croc <code>", "Receive files using the code from sender"],
        ["Send with custom code", "croc send --code mycode <file>", "Send with a custom code phrase"],
        ["Send to specific IP", "croc --relay <IP:port> send <file>", "Use specific relay server"],
    ]
    .map(|row| row.map(str::to_string).to_vec());
    app.table(&["Action", "Command", "Description"], &rows);

    app.section("Example workflow:");
    app.say(Tone::Normal, "1. On this pod: croc send myfile.txt");
    app.say(Tone::Normal, "2. On your computer: croc <code-shown-above>");
    app.say(Tone::Normal, "3. Files will be transferred securely!");
    app.blank();
    app.say(
        Tone::Muted,
        "Note: croc uses end-to-end encryption and works through NAT/firewalls",
    );
    Ok(())
}

/// Install croc unless it is already on PATH
pub fn install_croc(app: &mut App) -> Result<()> {
    install_croc_to(app, std::env::consts::ARCH, Path::new(CROC_DEST))
}

fn install_croc_to(app: &mut App, arch: &str, dest: &Path) -> Result<()> {
    app.say(Tone::Info, "Checking if croc is installed...");
    if app.runner().which("croc").is_some() {
        app.say(Tone::Success, "croc is already installed.");
        return Ok(());
    }

    app.say(Tone::Warning, "croc not found. Installing...");
    let url = croc_download_url(arch);
    app.say(
        Tone::Info,
        format!("Downloading croc for {} architecture...", croc_arch(arch)),
    );

    let work = tempfile::tempdir()?;
    let archive = work.path().join("croc.tar.gz");
    let fail = |e: PodrigError| PodrigError::action("croc installation", e.to_string());

    run_checked(
        app.runner(),
        &Cmd::new("curl")
            .args(["-fsSL", "-o"])
            .arg(archive.to_string_lossy())
            .arg(&url),
    )
    .map_err(fail)?;
    run_checked(
        app.runner(),
        &Cmd::new("tar")
            .arg("xzf")
            .arg(archive.to_string_lossy())
            .arg("-C")
            .arg(work.path().to_string_lossy()),
    )
    .map_err(fail)?;

    let binary: PathBuf = work.path().join("croc");
    if !binary.exists() {
        return Err(PodrigError::action(
            "croc installation",
            "croc binary not found in archive",
        ));
    }
    run_checked(
        app.runner(),
        &Cmd::new("install")
            .args(["-m", "0755"])
            .arg(binary.to_string_lossy())
            .arg(dest.to_string_lossy()),
    )
    .map_err(fail)?;

    tracing::info!(dest = %dest.display(), "croc installed");
    app.say(
        Tone::Success,
        format!("croc installed successfully to {}", dest.display()),
    );
    Ok(())
}

/// Ways to connect common SFTP clients
pub fn sftp_clients(ip: &str, port: &str) -> Vec<(&'static str, String)> {
    vec![
        ("FileZilla", format!("Host: sftp://{} | Port: {} | User: root", ip, port)),
        (
            "WinSCP",
            format!("Host: {} | Port: {} | Protocol: SFTP | User: root", ip, port),
        ),
        ("Command Line", format!("sftp -P {} root@{}", port, ip)),
        ("VS Code", format!("sftp://root@{}:{}", ip, port)),
    ]
}

/// Enable SSH, then show SFTP connection details
pub fn setup_sftp(app: &mut App) -> Result<()> {
    app.heading("SFTP Setup");
    app.say(Tone::Info, "Setting up SSH server for SFTP access...");
    if let Err(e) = ssh::enable_access(app, &ssh::SystemPaths::default()) {
        app.say(Tone::Error, "SSH setup failed. SFTP cannot be configured.");
        return Err(e);
    }
    show_sftp_details(app)
}

fn show_sftp_details(app: &mut App) -> Result<()> {
    let (ip, port) = app
        .env()
        .ssh_endpoint()
        .map(|(ip, port)| (ip.to_string(), port.to_string()))
        .ok_or_else(|| {
            PodrigError::missing(
                "SFTP connection details",
                "Set RUNPOD_PUBLIC_IP and RUNPOD_TCP_PORT_22.",
            )
        })?;

    let password_file = app.workspace_file(ssh::PASSWORD_FILE);
    let password = match ssh::saved_password(app) {
        Some(secret) => mask_secret(&secret),
        None => format!("Check {}", password_file.display()),
    };

    app.blank();
    app.say(Tone::Success, "SFTP Setup Complete!");
    app.section("Connection Details:");
    app.field("  Server Address", format!("sftp://{}", ip));
    app.field("  Port", port.clone());
    app.field("  Username", "root");
    app.field("  Password", password);

    app.section("How to connect with SFTP clients:");
    let rows: Vec<Vec<String>> = sftp_clients(&ip, &port)
        .into_iter()
        .map(|(client, config)| vec![client.to_string(), config])
        .collect();
    app.table(&["Client", "Configuration"], &rows);

    app.section("Important Notes:");
    app.bullet(
        Tone::Muted,
        format!("Password is saved in {}", password_file.display()),
    );
    app.bullet(Tone::Muted, "Root directory is accessible via SFTP");
    app.bullet(Tone::Muted, "Files can be uploaded/downloaded to/from any directory");
    app.bullet(Tone::Muted, "Connection is secured with SSH encryption");
    Ok(())
}
