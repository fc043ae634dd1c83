//! Test utilities for buildpipe-lib.
//!
//! Helpers for building scratch project trees and for shell commands that
//! stand in for a real compiler or distribution tool.

use std::fs;
use std::path::Path;

/// Write `content` to `root/relative`, creating parent directories.
pub fn write_file(root: &Path, relative: &str, content: &str) {
  let path = root.join(relative);
  if let Some(parent) = path.parent() {
    fs::create_dir_all(parent).unwrap();
  }
  fs::write(&path, content).unwrap();
}

/// A compile command that writes a single `Foo.class` into `$out`.
#[cfg(unix)]
pub fn fake_compile_cmd() -> &'static str {
  r#"printf 'compiled' > "$out/Foo.class""#
}

#[cfg(windows)]
pub fn fake_compile_cmd() -> &'static str {
  r#"Set-Content -NoNewline -Path "$env:out\Foo.class" -Value 'compiled'"#
}

/// A command that prints `msg` on stderr and exits with `code`.
#[cfg(unix)]
pub fn fail_cmd(msg: &str, code: i32) -> String {
  format!("echo '{}' >&2; exit {}", msg, code)
}

#[cfg(windows)]
pub fn fail_cmd(msg: &str, code: i32) -> String {
  format!("[Console]::Error.WriteLine('{}'); exit {}", msg, code)
}

/// A command that echoes an environment variable.
#[cfg(unix)]
pub fn echo_env(var: &str) -> String {
  format!("echo ${}", var)
}

#[cfg(windows)]
pub fn echo_env(var: &str) -> String {
  format!("Write-Output $env:{}", var)
}

/// A command that sleeps for `secs` seconds.
#[cfg(unix)]
pub fn sleep_cmd(secs: u64) -> String {
  format!("sleep {}", secs)
}

#[cfg(windows)]
pub fn sleep_cmd(secs: u64) -> String {
  format!("Start-Sleep -Seconds {}", secs)
}
