//! External command execution
//!
//! Every system change podrig makes goes through [`CommandRunner`], so the
//! action modules can be exercised against a mock in tests.

use std::env;
use std::fmt;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use secrecy::{ExposeSecret, SecretString};

use crate::core::interrupt::Interrupt;
use crate::error::{PodrigError, Result};

/// A command line to execute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cmd {
    pub program: String,
    pub args: Vec<String>,
    /// Data written to the child's stdin
    pub stdin: Option<String>,
    /// Indices into `args` shown as `****` when displayed
    pub redacted: Vec<usize>,
}

impl Cmd {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            stdin: None,
            redacted: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Argument that never appears in logs or error messages
    pub fn secret_arg(mut self, secret: &SecretString) -> Self {
        self.redacted.push(self.args.len());
        self.args.push(secret.expose_secret().to_string());
        self
    }

    pub fn stdin(mut self, input: impl Into<String>) -> Self {
        self.stdin = Some(input.into());
        self
    }

    /// `sh -c <script>`
    pub fn shell(script: impl Into<String>) -> Self {
        Self::new("sh").arg("-c").arg(script)
    }

    /// True when program and arguments equal the given words
    pub fn is(&self, words: &[&str]) -> bool {
        words.split_first().is_some_and(|(program, args)| {
            self.program == *program && self.args.iter().map(String::as_str).eq(args.iter().copied())
        })
    }
}

impl fmt::Display for Cmd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for (i, arg) in self.args.iter().enumerate() {
            if self.redacted.contains(&i) {
                write!(f, " ****")?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

/// Captured result of a finished command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub success: bool,
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// A successful run with the given stdout
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            success: true,
            code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// A failed run with the given stderr
    pub fn failed(stderr: impl Into<String>) -> Self {
        Self {
            success: false,
            code: Some(1),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// Best available description of why the command failed
    pub fn error_detail(&self) -> String {
        let stderr = self.stderr.trim();
        if !stderr.is_empty() {
            return stderr.to_string();
        }
        match self.code {
            Some(code) => format!("exit status {}", code),
            None => "terminated by signal".to_string(),
        }
    }
}

/// Narrow interface to the operating system's process table
#[cfg_attr(test, mockall::automock)]
pub trait CommandRunner {
    /// Run to completion with stdout/stderr captured
    fn output(&self, cmd: &Cmd) -> Result<CommandOutput>;

    /// Run to completion attached to the terminal; returns whether it succeeded
    fn status(&self, cmd: &Cmd) -> Result<bool>;

    /// Start a long-lived process without waiting for it; output goes to `log`
    fn spawn_detached(&self, cmd: &Cmd, log: &Path) -> Result<u32>;

    /// Locate an executable on PATH
    fn which(&self, program: &str) -> Option<PathBuf>;
}

/// Run a command with captured output, turning a non-zero exit into an error
pub fn run_checked(runner: &dyn CommandRunner, cmd: &Cmd) -> Result<CommandOutput> {
    let output = runner.output(cmd)?;
    if !output.success {
        return Err(PodrigError::CommandFailed {
            command: cmd.to_string(),
            detail: output.error_detail(),
        });
    }
    Ok(output)
}

/// Run a command attached to the terminal, turning failure into an error
///
/// The child shares our process group, so Ctrl-C reaches it directly. If the
/// interrupt fired while it ran the result is [`PodrigError::Cancelled`].
pub fn run_interactive(runner: &dyn CommandRunner, interrupt: &Interrupt, cmd: &Cmd) -> Result<()> {
    interrupt.take();
    let success = runner.status(cmd)?;
    if interrupt.take() {
        tracing::info!(command = %cmd, "interrupted");
        return Err(PodrigError::Cancelled);
    }
    if success {
        Ok(())
    } else {
        Err(PodrigError::CommandFailed {
            command: cmd.to_string(),
            detail: "see output above".to_string(),
        })
    }
}

/// [`CommandRunner`] backed by `std::process::Command`
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl SystemRunner {
    fn command(cmd: &Cmd) -> Command {
        let mut command = Command::new(&cmd.program);
        command.args(&cmd.args);
        command
    }

    fn spawn_error(cmd: &Cmd, e: std::io::Error) -> PodrigError {
        PodrigError::CommandSpawn {
            command: cmd.to_string(),
            reason: e.to_string(),
        }
    }
}

impl CommandRunner for SystemRunner {
    fn output(&self, cmd: &Cmd) -> Result<CommandOutput> {
        tracing::debug!(command = %cmd, "running");

        let mut command = Self::command(cmd);
        command.stdout(Stdio::piped()).stderr(Stdio::piped());
        command.stdin(if cmd.stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        });

        let mut child = command.spawn().map_err(|e| Self::spawn_error(cmd, e))?;

        if let (Some(input), Some(mut pipe)) = (&cmd.stdin, child.stdin.take()) {
            pipe.write_all(input.as_bytes())?;
            // pipe drops here so the child sees EOF
        }

        let output = child.wait_with_output()?;
        Ok(CommandOutput {
            success: output.status.success(),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    fn status(&self, cmd: &Cmd) -> Result<bool> {
        tracing::debug!(command = %cmd, "running attached");

        let mut command = Self::command(cmd);
        if cmd.stdin.is_some() {
            command.stdin(Stdio::piped());
        }
        let mut child = command.spawn().map_err(|e| Self::spawn_error(cmd, e))?;
        if let (Some(input), Some(mut pipe)) = (&cmd.stdin, child.stdin.take()) {
            pipe.write_all(input.as_bytes())?;
        }
        Ok(child.wait()?.success())
    }

    fn spawn_detached(&self, cmd: &Cmd, log: &Path) -> Result<u32> {
        tracing::debug!(command = %cmd, log = %log.display(), "spawning detached");

        if let Some(parent) = log.parent() {
            fs::create_dir_all(parent)?;
        }
        let out = File::create(log)?;
        let err = out.try_clone()?;

        let child = Self::command(cmd)
            .stdin(Stdio::null())
            .stdout(out)
            .stderr(err)
            .spawn()
            .map_err(|e| Self::spawn_error(cmd, e))?;
        Ok(child.id())
    }

    fn which(&self, program: &str) -> Option<PathBuf> {
        let paths = env::var_os("PATH")?;
        env::split_paths(&paths)
            .map(|dir| dir.join(program))
            .find(|candidate| is_executable(candidate))
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cmd_display() {
        let cmd = Cmd::new("apt-get").args(["install", "-y", "openssh-server"]);
        assert_eq!(cmd.to_string(), "apt-get install -y openssh-server");
        assert!(cmd.is(&["apt-get", "install", "-y", "openssh-server"]));
        assert!(!cmd.is(&["apt-get", "install"]));
    }

    #[test]
    fn test_secret_arg_is_redacted() {
        let token = SecretString::from("hf_secret".to_string());
        let cmd = Cmd::new("comfy").arg("--set-hf-api-token").secret_arg(&token);
        assert_eq!(cmd.to_string(), "comfy --set-hf-api-token ****");
        assert!(cmd.is(&["comfy", "--set-hf-api-token", "hf_secret"]));
    }

    #[test]
    fn test_shell_cmd() {
        let cmd = Cmd::shell("echo hi | cat");
        assert_eq!(cmd.program, "sh");
        assert_eq!(cmd.args, vec!["-c", "echo hi | cat"]);
    }

    #[test]
    fn test_error_detail() {
        assert_eq!(CommandOutput::failed("  boom \n").error_detail(), "boom");
        let silent = CommandOutput {
            code: Some(3),
            ..CommandOutput::default()
        };
        assert_eq!(silent.error_detail(), "exit status 3");
    }

    #[test]
    fn test_run_checked_maps_failure() {
        let mut runner = MockCommandRunner::new();
        runner
            .expect_output()
            .returning(|_| Ok(CommandOutput::failed("nope")));

        let err = run_checked(&runner, &Cmd::new("false")).unwrap_err();
        match err {
            PodrigError::CommandFailed { command, detail } => {
                assert_eq!(command, "false");
                assert_eq!(detail, "nope");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_interrupted_child_is_cancelled() {
        let interrupt = Interrupt::new();
        let signal = interrupt.clone();
        let mut runner = MockCommandRunner::new();
        runner.expect_status().times(1).returning(move |_| {
            signal.raise();
            Ok(false)
        });

        let err = run_interactive(&runner, &interrupt, &Cmd::new("apt-get")).unwrap_err();
        assert!(matches!(err, PodrigError::Cancelled));
        assert!(!interrupt.take());
    }

    #[test]
    fn test_stale_interrupt_does_not_cancel() {
        let interrupt = Interrupt::new();
        interrupt.raise();
        let mut runner = MockCommandRunner::new();
        runner.expect_status().times(1).returning(|_| Ok(true));

        run_interactive(&runner, &interrupt, &Cmd::new("true")).unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn test_system_runner_captures_output() {
        let output = SystemRunner
            .output(&Cmd::new("sh").args(["-c", "cat; echo err >&2"]).stdin("hello"))
            .unwrap();
        assert!(output.success);
        assert_eq!(output.stdout, "hello");
        assert_eq!(output.stderr.trim(), "err");
    }

    #[cfg(unix)]
    #[test]
    fn test_system_runner_missing_program() {
        let err = SystemRunner
            .output(&Cmd::new("definitely-not-a-real-program-xyz"))
            .unwrap_err();
        assert!(matches!(err, PodrigError::CommandSpawn { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_which_finds_sh() {
        assert!(SystemRunner.which("sh").is_some());
        assert!(SystemRunner.which("definitely-not-a-real-program-xyz").is_none());
    }
}
