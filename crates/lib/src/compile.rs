//! Compiler invocation.
//!
//! The compiler is an opaque collaborator: it receives a source directory and
//! a destination directory and is expected to leave compiled artifacts in the
//! destination. [`Compiler`] is the seam; [`CommandCompiler`] drives a real
//! toolchain through a shell command.

use std::collections::BTreeMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::consts::DEFAULT_COMPILE_COMMAND;
use crate::process::{ProcessError, RunOptions, run_shell};

/// Errors reported by the compile step.
#[derive(Debug, Error)]
pub enum CompileError {
  /// The source directory does not exist.
  #[error("source directory not found: {}", .0.display())]
  MissingSource(PathBuf),

  /// The compiler process could not be started.
  #[error("failed to start compiler: {0}")]
  Spawn(String),

  /// The compiler exited unsuccessfully.
  #[error("compiler exited with code {code:?}\n{diagnostics}")]
  Failed { code: Option<i32>, diagnostics: String },

  /// The compiler exited successfully but wrote diagnostics.
  #[error("compiler reported diagnostics\n{diagnostics}")]
  Diagnostics { diagnostics: String },

  #[error("compiler timed out after {}", humantime::format_duration(*.0))]
  TimedOut(Duration),
}

impl From<ProcessError> for CompileError {
  fn from(err: ProcessError) -> Self {
    match err {
      ProcessError::TimedOut(limit) => CompileError::TimedOut(limit),
      spawn @ ProcessError::Spawn { .. } => CompileError::Spawn(spawn.to_string()),
    }
  }
}

/// What a successful compilation left behind besides artifacts.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CompileOutput {
  /// Diagnostics tolerated because `fail_on_diagnostics` was off.
  pub warnings: Option<String>,
}

/// An external compiler.
pub trait Compiler {
  /// Compile everything under `src`, emitting artifacts into `dst`.
  ///
  /// `dst` exists when this is called. Partial output is not cleaned up on
  /// failure.
  fn compile(&self, src: &Path, dst: &Path) -> impl Future<Output = Result<CompileOutput, CompileError>> + Send;
}

/// Compiler driven by a shell command.
///
/// The command sees `$src` and `$out` in its environment and runs with the
/// project root as working directory.
#[derive(Debug, Clone)]
pub struct CommandCompiler {
  pub command: String,
  pub working_dir: PathBuf,
  pub shell: Option<String>,
  pub timeout: Option<Duration>,
  /// Treat stderr output from a successful run as a failure.
  pub fail_on_diagnostics: bool,
}

impl CommandCompiler {
  pub fn new(command: impl Into<String>, working_dir: impl Into<PathBuf>) -> Self {
    Self {
      command: command.into(),
      working_dir: working_dir.into(),
      shell: None,
      timeout: None,
      fail_on_diagnostics: true,
    }
  }

  /// The stock `javac` invocation.
  pub fn javac(working_dir: impl Into<PathBuf>) -> Self {
    Self::new(DEFAULT_COMPILE_COMMAND, working_dir)
  }
}

impl Compiler for CommandCompiler {
  async fn compile(&self, src: &Path, dst: &Path) -> Result<CompileOutput, CompileError> {
    if !src.is_dir() {
      return Err(CompileError::MissingSource(src.to_path_buf()));
    }

    info!(src = %src.display(), dst = %dst.display(), "compiling");

    let mut env = BTreeMap::new();
    env.insert("src", src);
    env.insert("out", dst);

    let options = RunOptions {
      shell: self.shell.as_deref(),
      timeout: self.timeout,
    };
    let output = run_shell(&self.command, &env, &self.working_dir, &options).await?;

    if !output.success {
      return Err(CompileError::Failed {
        code: output.code,
        diagnostics: output.diagnostics(),
      });
    }

    let stderr = output.stderr.trim();
    if stderr.is_empty() {
      return Ok(CompileOutput::default());
    }

    if self.fail_on_diagnostics {
      return Err(CompileError::Diagnostics {
        diagnostics: stderr.to_string(),
      });
    }

    warn!(diagnostics = %stderr, "compiler reported diagnostics");
    Ok(CompileOutput {
      warnings: Some(stderr.to_string()),
    })
  }
}
