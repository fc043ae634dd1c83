//! External process runner.
//!
//! The compiler and the command publisher are both shell commands. This module
//! runs them with a predictable environment and an optional timeout.

use std::collections::BTreeMap;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info};

use crate::consts::SOURCE_DATE_EPOCH;

/// Errors raised before a command produces an exit status.
#[derive(Debug, Error)]
pub enum ProcessError {
  /// The shell could not be started.
  #[error("failed to spawn {shell}: {source}")]
  Spawn {
    shell: String,
    #[source]
    source: std::io::Error,
  },

  /// The command ran longer than its timeout and was killed.
  #[error("command timed out after {}", humantime::format_duration(*.0))]
  TimedOut(Duration),
}

/// Captured outcome of a finished command.
#[derive(Debug, Clone)]
pub struct CommandOutput {
  /// Exit code, `None` when the process was terminated by a signal.
  pub code: Option<i32>,
  pub success: bool,
  pub stdout: String,
  pub stderr: String,
}

impl CommandOutput {
  /// Stderr followed by stdout, trimmed. This is what a user sees as
  /// "the diagnostics" of a failed tool.
  pub fn diagnostics(&self) -> String {
    let stderr = self.stderr.trim();
    let stdout = self.stdout.trim();
    match (stderr.is_empty(), stdout.is_empty()) {
      (false, false) => format!("{}\n{}", stderr, stdout),
      (false, true) => stderr.to_string(),
      (true, false) => stdout.to_string(),
      (true, true) => String::new(),
    }
  }
}

/// Options shared by every command invocation.
#[derive(Debug, Clone, Default)]
pub struct RunOptions<'a> {
  /// Shell override. Defaults to `/bin/sh` on Unix and `powershell.exe` on Windows.
  pub shell: Option<&'a str>,
  /// Kill the command when it runs longer than this.
  pub timeout: Option<Duration>,
}

/// Run `cmd` through a shell in `cwd`.
///
/// The parent environment is inherited so tools on `PATH` (javac, rsync, ...)
/// are found. On top of it the runner sets:
/// - `LANG`/`LC_ALL` to `C` so diagnostics are not localized
/// - `SOURCE_DATE_EPOCH` to the ZIP epoch for tools that embed timestamps
/// - every entry of `env`
///
/// A non-zero exit is not an error here; callers decide what failure means
/// for their step.
pub async fn run_shell(
  cmd: &str,
  env: &BTreeMap<&str, &Path>,
  cwd: &Path,
  options: &RunOptions<'_>,
) -> Result<CommandOutput, ProcessError> {
  info!(cmd = %cmd, "executing command");

  let (shell, flags) = shell_invocation(options.shell);

  let mut command = Command::new(shell);
  command
    .args(flags)
    .arg(cmd)
    .current_dir(cwd)
    .env("LANG", "C")
    .env("LC_ALL", "C")
    .env("SOURCE_DATE_EPOCH", SOURCE_DATE_EPOCH)
    .stdin(Stdio::null())
    .kill_on_drop(true);

  for (key, value) in env {
    command.env(key, value);
  }

  debug!(shell = %shell, working_dir = ?cwd, "spawning process");

  let output = command.output();
  let output = match options.timeout {
    Some(limit) => tokio::time::timeout(limit, output)
      .await
      .map_err(|_| ProcessError::TimedOut(limit))?,
    None => output.await,
  }
  .map_err(|source| ProcessError::Spawn {
    shell: shell.to_string(),
    source,
  })?;

  let result = CommandOutput {
    code: output.status.code(),
    success: output.status.success(),
    stdout: String::from_utf8_lossy(&output.stdout).to_string(),
    stderr: String::from_utf8_lossy(&output.stderr).to_string(),
  };

  if !result.stderr.is_empty() {
    debug!(stderr = %result.stderr.trim(), "command stderr");
  }
  if !result.stdout.is_empty() {
    debug!(stdout = %result.stdout.trim(), "command stdout");
  }

  Ok(result)
}

/// Flags that make `shell` treat the next argument as a command string.
fn command_flags(shell: &str) -> &'static [&'static str] {
  let name = Path::new(shell)
    .file_stem()
    .and_then(|stem| stem.to_str())
    .unwrap_or(shell)
    .to_ascii_lowercase();

  match name.as_str() {
    "powershell" | "pwsh" => &["-NoProfile", "-Command"],
    "cmd" => &["/C"],
    _ => &["-c"],
  }
}

/// The shell binary and its flags, honoring an override.
fn shell_invocation(override_shell: Option<&str>) -> (&str, &'static [&'static str]) {
  match override_shell {
    Some(shell) => (shell, command_flags(shell)),
    #[cfg(unix)]
    None => ("/bin/sh", &["-c"]),
    #[cfg(windows)]
    None => ("powershell.exe", &["-NoProfile", "-ExecutionPolicy", "Bypass", "-Command"]),
  }
}
