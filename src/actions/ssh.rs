//! SSH server setup
//!
//! Installs and configures `sshd` for password login as root, sets a fresh
//! random root password and writes connection helper scripts into the
//! workspace.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use rand::distributions::Alphanumeric;
use rand::Rng;
use secrecy::{ExposeSecret, SecretString};
use tempfile::NamedTempFile;

use crate::core::process::{run_checked, run_interactive, Cmd};
use crate::error::{PodrigError, Result};
use crate::tui::app::App;
use crate::tui::theme::Tone;

pub const PASSWORD_FILE: &str = "root_password.txt";
const PASSWORD_LEN: usize = 12;
const BACKUP_NAME: &str = "sshd_config.podrig.bak";

/// Directives forced in `sshd_config`, in insertion order
const DIRECTIVES: &[(&str, &str)] = &[("PermitRootLogin", "yes"), ("PasswordAuthentication", "yes")];

/// Host keys generated when missing: file name, key type, extra arguments
const HOST_KEYS: &[(&str, &str, &[&str])] = &[
    ("ssh_host_ed25519_key", "ed25519", &[]),
    ("ssh_host_rsa_key", "rsa", &["-b", "4096"]),
];

/// System locations the setup touches
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemPaths {
    /// Usually `/etc/ssh`
    pub ssh_dir: PathBuf,
    pub os_release: PathBuf,
    /// Usually `/etc/init.d`
    pub init_dir: PathBuf,
}

impl Default for SystemPaths {
    fn default() -> Self {
        Self {
            ssh_dir: PathBuf::from("/etc/ssh"),
            os_release: PathBuf::from("/etc/os-release"),
            init_dir: PathBuf::from("/etc/init.d"),
        }
    }
}

impl SystemPaths {
    fn sshd_config(&self) -> PathBuf {
        self.ssh_dir.join("sshd_config")
    }

    fn backup(&self) -> PathBuf {
        self.ssh_dir.join(BACKUP_NAME)
    }
}

/// Package family, decided from `/etc/os-release`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Distro {
    Debian,
    RedHat,
    Unknown,
}

impl Distro {
    pub fn from_os_release(contents: &str) -> Self {
        let contents = contents.to_lowercase();
        if contents.contains("ubuntu") || contents.contains("debian") {
            Distro::Debian
        } else if ["redhat", "centos", "rhel"].iter().any(|id| contents.contains(id)) {
            Distro::RedHat
        } else {
            Distro::Unknown
        }
    }

    fn install_commands(self) -> Option<Vec<Cmd>> {
        match self {
            Distro::Debian => Some(vec![
                Cmd::new("apt-get").arg("update"),
                Cmd::new("apt-get").args(["install", "-y", "openssh-server"]),
            ]),
            Distro::RedHat => Some(vec![Cmd::new("yum").args(["install", "-y", "openssh-server"])]),
            Distro::Unknown => None,
        }
    }
}

/// Rewrite `sshd_config` text so each directive is set once, before any
/// `Match` block
///
/// Existing occurrences outside `Match` blocks are dropped; those inside are
/// left alone. Without a `Match` block the directives are appended.
pub fn set_directives(contents: &str, directives: &[(&str, &str)]) -> String {
    let keys: Vec<String> = directives.iter().map(|(k, _)| k.to_lowercase()).collect();
    let is_match = |line: &str| line.trim().to_lowercase().starts_with("match ");

    let mut in_match = false;
    let mut kept: Vec<&str> = Vec::new();
    for line in contents.lines() {
        let trimmed = line.trim();
        if is_match(line) {
            in_match = true;
        }
        if trimmed.is_empty() || trimmed.starts_with('#') {
            kept.push(line);
            continue;
        }
        let key = trimmed.split_whitespace().next().unwrap_or_default().to_lowercase();
        if !in_match && keys.contains(&key) {
            continue;
        }
        kept.push(line);
    }

    let block: Vec<String> = directives.iter().map(|(k, v)| format!("{} {}", k, v)).collect();
    let mut out: Vec<String> = Vec::with_capacity(kept.len() + block.len() + 1);
    match kept.iter().position(|line| is_match(line)) {
        Some(at) => {
            out.extend(kept[..at].iter().map(|s| s.to_string()));
            out.extend(block);
            out.extend(kept[at..].iter().map(|s| s.to_string()));
        }
        None => {
            out.extend(kept.iter().map(|s| s.to_string()));
            out.push(String::new());
            out.extend(block);
        }
    }

    let mut text = out.join("\n");
    text.push('\n');
    text
}

/// Random alphanumeric root password
pub fn generate_password() -> SecretString {
    let password: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(PASSWORD_LEN)
        .map(char::from)
        .collect();
    SecretString::from(password)
}

/// Windows and Linux/macOS helper scripts, in that order
pub fn connection_scripts(ip: &str, port: &str, password: &SecretString) -> (String, String) {
    let password = password.expose_secret();
    let windows = format!(
        "@echo off\r\necho Root password: {}\r\nssh root@{} -p {}\r\n",
        password, ip, port
    );
    let linux = format!(
        "#!/bin/bash\necho Root password: {}\nssh root@{} -p {}\n",
        password, ip, port
    );
    (windows, linux)
}

/// Full SSH setup on the real system
pub fn setup(app: &mut App) -> Result<()> {
    setup_with(app, &SystemPaths::default())
}

/// Full SSH setup against the given system paths
pub fn setup_with(app: &mut App, paths: &SystemPaths) -> Result<()> {
    app.heading("SSH Setup");
    enable_access(app, paths)
}

/// The setup steps, without clearing the screen first
pub fn enable_access(app: &mut App, paths: &SystemPaths) -> Result<()> {
    let (ip, port) = check_environment(app)?;
    install_server(app, paths)?;
    generate_host_keys(app, paths)?;
    configure_sshd(app, paths)?;
    let password = set_root_password(app)?;
    write_scripts(app, &ip, &port, &password)?;

    app.blank();
    app.say(Tone::Success, "Setup Completed Successfully!");
    app.field("Connect with", format!("ssh root@{} -p {}", ip, port));
    tracing::info!(%ip, %port, "ssh setup complete");
    Ok(())
}

fn check_environment(app: &mut App) -> Result<(String, String)> {
    app.say(Tone::Info, "Checking environment variables...");
    let missing = app.env().missing_ssh_vars();
    if !missing.is_empty() {
        return Err(PodrigError::missing(
            format!("SSH access ({} unset)", missing.join(", ")),
            "Expose TCP port 22 and enable a public IP for this pod, then run the setup again.",
        ));
    }

    let (ip, port) = app
        .env()
        .ssh_endpoint()
        .map(|(ip, port)| (ip.to_string(), port.to_string()))
        .ok_or_else(|| PodrigError::missing("SSH access", "Set RUNPOD_PUBLIC_IP and RUNPOD_TCP_PORT_22."))?;
    app.say(Tone::Success, "Environment variables are set.");
    Ok((ip, port))
}

fn install_server(app: &mut App, paths: &SystemPaths) -> Result<()> {
    if app.runner().which("sshd").is_some() {
        app.say(Tone::Success, "SSH Server is already installed.");
        return Ok(());
    }

    app.say(Tone::Warning, "SSH server not found. Installing...");
    app.say(Tone::Info, "Detecting Linux Distribution...");
    let distro = fs::read_to_string(&paths.os_release)
        .map(|contents| Distro::from_os_release(&contents))
        .unwrap_or(Distro::Unknown);
    tracing::debug!(?distro, "detected distribution");

    let commands = distro.install_commands().ok_or_else(|| {
        PodrigError::action(
            "SSH server installation",
            "unsupported Linux distribution; install openssh-server manually",
        )
    })?;
    for cmd in &commands {
        run_interactive(app.runner(), app.interrupt(), cmd)?;
    }

    app.say(Tone::Success, "SSH Server Installed Successfully.");
    Ok(())
}

fn generate_host_keys(app: &mut App, paths: &SystemPaths) -> Result<()> {
    app.say(Tone::Info, "Checking for SSH host keys...");

    let mut generated = false;
    for (file, kind, extra) in HOST_KEYS {
        let key_path = paths.ssh_dir.join(file);
        if key_path.exists() {
            continue;
        }

        app.say(Tone::Info, format!("Generating {} host key...", kind));
        let cmd = Cmd::new("ssh-keygen")
            .args(["-t", *kind, "-f"])
            .arg(key_path.to_string_lossy())
            .args(["-N", ""])
            .args(extra.iter().copied());
        run_checked(app.runner(), &cmd)?;
        tighten_key_permissions(&key_path);
        generated = true;
    }

    if generated {
        app.say(Tone::Success, "SSH host keys generated successfully.");
    } else {
        app.say(Tone::Success, "SSH host keys are already present.");
    }
    Ok(())
}

#[cfg(unix)]
fn tighten_key_permissions(key: &Path) {
    use std::os::unix::fs::PermissionsExt;

    let mut public = key.as_os_str().to_owned();
    public.push(".pub");
    for (path, mode) in [(key.to_path_buf(), 0o600), (PathBuf::from(public), 0o644)] {
        if !path.exists() {
            continue;
        }
        if let Err(e) = fs::set_permissions(&path, fs::Permissions::from_mode(mode)) {
            tracing::warn!("Could not set permissions on {}: {}", path.display(), e);
        }
    }
}

#[cfg(not(unix))]
fn tighten_key_permissions(_key: &Path) {}

fn configure_sshd(app: &mut App, paths: &SystemPaths) -> Result<()> {
    app.say(Tone::Info, "Configuring SSH to allow root login with a password...");

    let config_path = paths.sshd_config();
    let original = fs::read_to_string(&config_path)?;
    let updated = set_directives(&original, DIRECTIVES);

    let mut candidate = NamedTempFile::new_in(&paths.ssh_dir)?;
    candidate.write_all(updated.as_bytes())?;
    candidate.flush()?;

    let check = Cmd::new("sshd")
        .args(["-t", "-f"])
        .arg(candidate.path().to_string_lossy());
    let output = app.runner().output(&check)?;
    if !output.success {
        return Err(PodrigError::action(
            "SSH configuration",
            format!("new sshd_config is invalid: {}", output.error_detail()),
        ));
    }

    let backup = paths.backup();
    if !backup.exists() {
        match fs::copy(&config_path, &backup) {
            Ok(_) => app.say(Tone::Success, format!("Backup saved to {}", backup.display())),
            Err(e) => tracing::warn!("Could not back up sshd_config: {}", e),
        }
    }

    candidate
        .persist(&config_path)
        .map_err(|e| PodrigError::Io(e.error))?;
    app.say(Tone::Success, "SSH Configuration Updated.");

    restart_service(app, paths);
    Ok(())
}

/// Restart sshd without systemd; failure is only a warning
fn restart_service(app: &mut App, paths: &SystemPaths) -> bool {
    let mut errors = Vec::new();

    let managers: Vec<&str> = ["service", "rc-service"]
        .into_iter()
        .filter(|m| app.runner().which(m).is_some())
        .collect();
    for manager in managers {
        for service in ["sshd", "ssh"] {
            let cmd = Cmd::new(manager).args([service, "restart"]);
            match app.runner().output(&cmd) {
                Ok(out) if out.success => {
                    app.say(Tone::Success, format!("SSH service restarted via {} ({}).", manager, service));
                    return true;
                }
                Ok(out) => errors.push(format!("{}: {}", cmd, out.error_detail())),
                Err(e) => errors.push(format!("{}: {}", cmd, e)),
            }
        }
    }

    for service in ["sshd", "ssh"] {
        let script = paths.init_dir.join(service);
        if !script.exists() {
            continue;
        }
        let cmd = Cmd::new(script.to_string_lossy()).arg("restart");
        match app.runner().output(&cmd) {
            Ok(out) if out.success => {
                app.say(Tone::Success, format!("SSH service restarted via {}.", script.display()));
                return true;
            }
            Ok(out) => errors.push(format!("{}: {}", cmd, out.error_detail())),
            Err(e) => errors.push(format!("{}: {}", cmd, e)),
        }
    }

    app.say(Tone::Warning, "Could not restart SSH service automatically. Try manually.");
    if !errors.is_empty() {
        app.say(Tone::Warning, errors.join("; "));
    }
    false
}

fn set_root_password(app: &mut App) -> Result<SecretString> {
    app.say(Tone::Info, "Generating a secure random password for root...");
    let password = generate_password();

    let cmd = Cmd::new("chpasswd").stdin(format!("root:{}", password.expose_secret()));
    run_checked(app.runner(), &cmd).map_err(|e| PodrigError::action("Setting the root password", e.to_string()))?;

    let file = app.workspace_file(PASSWORD_FILE);
    if let Some(dir) = file.parent() {
        fs::create_dir_all(dir)?;
    }
    fs::write(&file, password.expose_secret())?;
    app.say(
        Tone::Success,
        format!("Root password generated and saved in {}", file.display()),
    );
    Ok(password)
}

fn write_scripts(app: &mut App, ip: &str, port: &str, password: &SecretString) -> Result<()> {
    let (windows, linux) = connection_scripts(ip, port, password);
    let workspace = app.config().workspace_dir.clone();

    app.say(Tone::Info, "Creating connection script for Windows...");
    fs::write(app.workspace_file("connect_windows.bat"), windows)?;
    app.say(
        Tone::Success,
        format!("Windows connection script created in {}.", workspace.display()),
    );

    app.say(Tone::Info, "Creating connection script for Linux/Mac...");
    let linux_path = app.workspace_file("connect_linux.sh");
    fs::write(&linux_path, linux)?;
    make_executable(&linux_path)?;
    app.say(
        Tone::Success,
        format!("Linux/Mac connection script created in {}.", workspace.display()),
    );
    Ok(())
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755))?;
    Ok(())
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<()> {
    Ok(())
}

/// Root password saved by a previous setup
pub fn saved_password(app: &App) -> Option<SecretString> {
    fs::read_to_string(app.workspace_file(PASSWORD_FILE))
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .map(SecretString::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::process::{CommandOutput, MockCommandRunner};
    use crate::core::{Config, PodEnvironment};
    use crate::tui::prompt::ScriptedPrompt;
    use crate::tui::sink::MemorySink;
    use tempfile::TempDir;

    #[test]
    fn test_set_directives_replaces_outside_match() {
        let config = "\
# comment PermitRootLogin no
Port 22
PermitRootLogin prohibit-password
passwordauthentication no
UsePAM yes
Match User guest
    PasswordAuthentication no
";
        let out = set_directives(config, DIRECTIVES);
        assert_eq!(
            out,
            "\
# comment PermitRootLogin no
Port 22
UsePAM yes
PermitRootLogin yes
PasswordAuthentication yes
Match User guest
    PasswordAuthentication no
"
        );
    }

    #[test]
    fn test_set_directives_appends_without_match() {
        let out = set_directives("Port 22\nPermitRootLogin no\n", DIRECTIVES);
        assert_eq!(out, "Port 22\n\nPermitRootLogin yes\nPasswordAuthentication yes\n");

        // Applying twice gives the same file
        let again = set_directives(&out, DIRECTIVES);
        assert_eq!(again.matches("PermitRootLogin yes").count(), 1);
    }

    #[test]
    fn test_distro_detection() {
        assert_eq!(Distro::from_os_release("ID=ubuntu\nID_LIKE=debian"), Distro::Debian);
        assert_eq!(Distro::from_os_release("ID=\"centos\""), Distro::RedHat);
        assert_eq!(Distro::from_os_release("ID=alpine"), Distro::Unknown);
    }

    #[test]
    fn test_password_shape() {
        let password = generate_password();
        let exposed = password.expose_secret();
        assert_eq!(exposed.len(), PASSWORD_LEN);
        assert!(exposed.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_connection_scripts() {
        let (windows, linux) = connection_scripts("1.2.3.4", "10022", &SecretString::from("pw".to_string()));
        assert!(windows.starts_with("@echo off"));
        assert!(windows.contains("ssh root@1.2.3.4 -p 10022"));
        assert!(linux.starts_with("#!/bin/bash\n"));
        assert!(linux.contains("echo Root password: pw\n"));
    }

    fn ssh_env() -> PodEnvironment {
        PodEnvironment {
            public_ip: Some("1.2.3.4".into()),
            ssh_port: Some("10022".into()),
            ..PodEnvironment::default()
        }
    }

    fn app_in(workspace: &Path, runner: MockCommandRunner, env: PodEnvironment, sink: &MemorySink) -> App {
        let config = Config {
            workspace_dir: workspace.to_path_buf(),
            ..Config::default()
        };
        App::new(config)
            .with_runner(runner)
            .with_env(env)
            .with_output(sink.clone())
            .with_prompt(ScriptedPrompt::default())
    }

    #[test]
    fn test_missing_env_is_configuration_error() {
        let dir = TempDir::new().unwrap();
        let sink = MemorySink::new();
        let mut app = app_in(dir.path(), MockCommandRunner::new(), PodEnvironment::default(), &sink);

        let err = setup_with(&mut app, &SystemPaths::default()).unwrap_err();
        match err {
            PodrigError::ConfigurationMissing { what, .. } => {
                assert!(what.contains("RUNPOD_PUBLIC_IP"));
                assert!(what.contains("RUNPOD_TCP_PORT_22"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_full_setup_on_prepared_system() {
        let workspace = TempDir::new().unwrap();
        let etc = TempDir::new().unwrap();
        let paths = SystemPaths {
            ssh_dir: etc.path().join("ssh"),
            os_release: etc.path().join("os-release"),
            init_dir: etc.path().join("init.d"),
        };
        fs::create_dir_all(&paths.ssh_dir).unwrap();
        fs::write(paths.sshd_config(), "Port 22\nPermitRootLogin no\n").unwrap();
        for (file, _, _) in HOST_KEYS {
            fs::write(paths.ssh_dir.join(file), "key").unwrap();
        }

        let mut runner = MockCommandRunner::new();
        runner
            .expect_which()
            .returning(|name| (name == "sshd" || name == "service").then(|| PathBuf::from("/usr/sbin").join(name)));
        runner
            .expect_output()
            .withf(|cmd| cmd.program == "sshd" && cmd.args[0] == "-t")
            .times(1)
            .returning(|_| Ok(CommandOutput::ok("")));
        runner
            .expect_output()
            .withf(|cmd| cmd.is(&["service", "sshd", "restart"]))
            .times(1)
            .returning(|_| Ok(CommandOutput::failed("unrecognized service")));
        runner
            .expect_output()
            .withf(|cmd| cmd.is(&["service", "ssh", "restart"]))
            .times(1)
            .returning(|_| Ok(CommandOutput::ok("")));
        runner
            .expect_output()
            .withf(|cmd| {
                cmd.program == "chpasswd"
                    && cmd.stdin.as_deref().is_some_and(|s| s.starts_with("root:") && s.len() == 17)
            })
            .times(1)
            .returning(|_| Ok(CommandOutput::ok("")));

        let sink = MemorySink::new();
        let mut app = app_in(workspace.path(), runner, ssh_env(), &sink);
        setup_with(&mut app, &paths).unwrap();

        let config = fs::read_to_string(paths.sshd_config()).unwrap();
        assert!(config.contains("PermitRootLogin yes"));
        assert!(!config.contains("PermitRootLogin no"));
        assert_eq!(fs::read_to_string(paths.backup()).unwrap(), "Port 22\nPermitRootLogin no\n");

        let password = fs::read_to_string(workspace.path().join(PASSWORD_FILE)).unwrap();
        assert_eq!(password.len(), PASSWORD_LEN);
        let linux = fs::read_to_string(workspace.path().join("connect_linux.sh")).unwrap();
        assert!(linux.contains(&password));
        assert!(workspace.path().join("connect_windows.bat").exists());

        assert!(sink.text().contains("SSH service restarted via service (ssh)."));
        assert!(sink.lines_with(Tone::Error).is_empty());
    }

    #[test]
    fn test_invalid_config_is_not_applied() {
        let workspace = TempDir::new().unwrap();
        let etc = TempDir::new().unwrap();
        let paths = SystemPaths {
            ssh_dir: etc.path().to_path_buf(),
            os_release: etc.path().join("os-release"),
            init_dir: etc.path().join("init.d"),
        };
        fs::write(paths.sshd_config(), "Bogus directive\n").unwrap();
        for (file, _, _) in HOST_KEYS {
            fs::write(paths.ssh_dir.join(file), "key").unwrap();
        }

        let mut runner = MockCommandRunner::new();
        runner.expect_which().returning(|_| Some(PathBuf::from("/usr/sbin/sshd")));
        runner
            .expect_output()
            .returning(|_| Ok(CommandOutput::failed("Bad configuration option: Bogus")));

        let sink = MemorySink::new();
        let mut app = app_in(workspace.path(), runner, ssh_env(), &sink);
        let err = configure_sshd(&mut app, &paths).unwrap_err();

        assert!(err.to_string().contains("Bad configuration option"));
        assert_eq!(fs::read_to_string(paths.sshd_config()).unwrap(), "Bogus directive\n");
        assert!(!paths.backup().exists());
    }

    #[test]
    fn test_unknown_distro_fails_install() {
        let workspace = TempDir::new().unwrap();
        let etc = TempDir::new().unwrap();
        let paths = SystemPaths {
            ssh_dir: etc.path().to_path_buf(),
            os_release: etc.path().join("os-release"),
            init_dir: etc.path().join("init.d"),
        };
        fs::write(&paths.os_release, "ID=alpine\n").unwrap();

        let mut runner = MockCommandRunner::new();
        runner.expect_which().returning(|_| None);

        let sink = MemorySink::new();
        let mut app = app_in(workspace.path(), runner, ssh_env(), &sink);
        let err = install_server(&mut app, &paths).unwrap_err();
        assert!(matches!(err, PodrigError::ActionFailed { .. }));
    }

    #[test]
    fn test_debian_install_runs_apt() {
        let workspace = TempDir::new().unwrap();
        let etc = TempDir::new().unwrap();
        let paths = SystemPaths {
            ssh_dir: etc.path().to_path_buf(),
            os_release: etc.path().join("os-release"),
            init_dir: etc.path().join("init.d"),
        };
        fs::write(&paths.os_release, "NAME=\"Ubuntu\"\nID=ubuntu\n").unwrap();

        let mut runner = MockCommandRunner::new();
        runner.expect_which().returning(|_| None);
        let mut seq = mockall::Sequence::new();
        runner
            .expect_status()
            .withf(|cmd| cmd.is(&["apt-get", "update"]))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(true));
        runner
            .expect_status()
            .withf(|cmd| cmd.is(&["apt-get", "install", "-y", "openssh-server"]))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(true));

        let sink = MemorySink::new();
        let mut app = app_in(workspace.path(), runner, ssh_env(), &sink);
        install_server(&mut app, &paths).unwrap();
        assert!(sink.text().contains("SSH Server Installed Successfully."));
    }
}
