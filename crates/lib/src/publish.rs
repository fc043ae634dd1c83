//! Distribution hand-off.
//!
//! Publishing is opaque to the pipeline: a [`Publisher`] receives the
//! directory holding the finished archive and either succeeds or fails.

use std::collections::BTreeMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::fs::{FilesystemError, copy_tree, normalize_path};
use crate::process::{ProcessError, RunOptions, run_shell};

/// Errors reported by the publish step.
#[derive(Debug, Error)]
pub enum PublishError {
  #[error("publish directory not found: {}", .0.display())]
  MissingDirectory(PathBuf),

  #[error("failed to start publish command: {0}")]
  Spawn(String),

  /// The publish command exited unsuccessfully.
  #[error("publish command exited with code {code:?}\n{diagnostics}")]
  Failed { code: Option<i32>, diagnostics: String },

  #[error("publish timed out after {}", humantime::format_duration(*.0))]
  TimedOut(Duration),

  /// The destination lies inside the directory being published.
  #[error("publish destination {} is inside {}", .destination.display(), .dir.display())]
  DestinationInsideSource { destination: PathBuf, dir: PathBuf },

  /// Copying into the destination directory failed.
  #[error("failed to copy to {}: {source}", .destination.display())]
  Copy {
    destination: PathBuf,
    #[source]
    source: FilesystemError,
  },
}

impl From<ProcessError> for PublishError {
  fn from(err: ProcessError) -> Self {
    match err {
      ProcessError::TimedOut(limit) => PublishError::TimedOut(limit),
      spawn @ ProcessError::Spawn { .. } => PublishError::Spawn(spawn.to_string()),
    }
  }
}

/// What a publisher reports back.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PublishReceipt {
  /// Where the files went, as the publisher describes it.
  pub destination: String,
  /// Files handed off, relative to the published directory. Empty when the
  /// publisher cannot tell (e.g. an external command).
  pub files: Vec<String>,
}

/// A distribution mechanism.
pub trait Publisher {
  fn publish(&self, dir: &Path) -> impl Future<Output = Result<PublishReceipt, PublishError>> + Send;
}

/// Publishes by running a shell command with `$dist` set to the directory.
#[derive(Debug, Clone)]
pub struct CommandPublisher {
  pub command: String,
  pub working_dir: PathBuf,
  pub shell: Option<String>,
  pub timeout: Option<Duration>,
}

impl CommandPublisher {
  pub fn new(command: impl Into<String>, working_dir: impl Into<PathBuf>) -> Self {
    Self {
      command: command.into(),
      working_dir: working_dir.into(),
      shell: None,
      timeout: None,
    }
  }
}

impl Publisher for CommandPublisher {
  async fn publish(&self, dir: &Path) -> Result<PublishReceipt, PublishError> {
    if !dir.is_dir() {
      return Err(PublishError::MissingDirectory(dir.to_path_buf()));
    }

    let mut env = BTreeMap::new();
    env.insert("dist", dir);

    let options = RunOptions {
      shell: self.shell.as_deref(),
      timeout: self.timeout,
    };
    let output = run_shell(&self.command, &env, &self.working_dir, &options).await?;

    if !output.success {
      return Err(PublishError::Failed {
        code: output.code,
        diagnostics: output.diagnostics(),
      });
    }

    info!(dir = %dir.display(), "published via command");
    Ok(PublishReceipt {
      destination: self.command.clone(),
      files: Vec::new(),
    })
  }
}

/// Publishes by copying the directory's files into another directory,
/// such as a mounted share or a local repository.
#[derive(Debug, Clone)]
pub struct DirectoryPublisher {
  pub destination: PathBuf,
}

impl DirectoryPublisher {
  pub fn new(destination: impl Into<PathBuf>) -> Self {
    Self {
      destination: destination.into(),
    }
  }
}

impl Publisher for DirectoryPublisher {
  async fn publish(&self, dir: &Path) -> Result<PublishReceipt, PublishError> {
    if !dir.is_dir() {
      return Err(PublishError::MissingDirectory(dir.to_path_buf()));
    }
    if normalize_path(&self.destination).starts_with(normalize_path(dir)) {
      return Err(PublishError::DestinationInsideSource {
        destination: self.destination.clone(),
        dir: dir.to_path_buf(),
      });
    }

    let copied = copy_tree(dir, &self.destination).map_err(|source| PublishError::Copy {
      destination: self.destination.clone(),
      source,
    })?;

    info!(
      dir = %dir.display(),
      destination = %self.destination.display(),
      files = copied.len(),
      "published to directory"
    );
    Ok(PublishReceipt {
      destination: self.destination.display().to_string(),
      files: copied.into_iter().map(|f| f.relative).collect(),
    })
  }
}

/// The publisher selected by configuration.
#[derive(Debug, Clone)]
pub enum ConfiguredPublisher {
  Command(CommandPublisher),
  Directory(DirectoryPublisher),
}

impl Publisher for ConfiguredPublisher {
  async fn publish(&self, dir: &Path) -> Result<PublishReceipt, PublishError> {
    match self {
      ConfiguredPublisher::Command(publisher) => publisher.publish(dir).await,
      ConfiguredPublisher::Directory(publisher) => publisher.publish(dir).await,
    }
  }
}
