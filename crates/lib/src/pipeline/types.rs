//! Types for pipeline execution.
//!
//! This module defines the pipeline's steps and states, the error types a
//! step can fail with, the resolved path layout, and the final report.

use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use crate::archive::{ArchiveSummary, MATCH_ALL, PackagingError};
use crate::compile::{CompileError, CompileOutput};
use crate::fs::{FilesystemError, normalize_path};
use crate::publish::{PublishError, PublishReceipt};
use crate::resources::MergeReport;

/// One unit of work in the pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Step {
  Prepare,
  Compile,
  Merge,
  Package,
  Publish,
}

impl Step {
  pub const ALL: [Step; 5] = [Step::Prepare, Step::Compile, Step::Merge, Step::Package, Step::Publish];

  pub fn as_str(self) -> &'static str {
    match self {
      Step::Prepare => "prepare",
      Step::Compile => "compile",
      Step::Merge => "merge",
      Step::Package => "package",
      Step::Publish => "publish",
    }
  }

  /// The state the pipeline must be in for this step to run.
  pub fn requires(self) -> PipelineState {
    match self {
      Step::Prepare => PipelineState::Init,
      Step::Compile => PipelineState::Prepared,
      Step::Merge => PipelineState::Compiled,
      Step::Package => PipelineState::Merged,
      Step::Publish => PipelineState::Packaged,
    }
  }

  /// The state the pipeline moves to once this step succeeds.
  pub fn produces(self) -> PipelineState {
    match self {
      Step::Prepare => PipelineState::Prepared,
      Step::Compile => PipelineState::Compiled,
      Step::Merge => PipelineState::Merged,
      Step::Package => PipelineState::Packaged,
      Step::Publish => PipelineState::Published,
    }
  }
}

impl std::fmt::Display for Step {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Where a pipeline run stands.
///
/// Transitions only move forward:
///
/// ```text
/// Init -> Prepared -> Compiled -> Merged -> Packaged -> Published
///   \________\___________\__________\_________\______-> Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "step", rename_all = "lowercase")]
pub enum PipelineState {
  Init,
  Prepared,
  Compiled,
  Merged,
  Packaged,
  Published,
  /// A step failed; the run is over.
  Failed(Step),
}

impl PipelineState {
  pub fn is_terminal(self) -> bool {
    matches!(self, PipelineState::Published | PipelineState::Failed(_))
  }

  /// The next step to run from this state, if any.
  pub fn next_step(self) -> Option<Step> {
    Step::ALL.into_iter().find(|step| step.requires() == self)
  }
}

/// The failure of a single step.
#[derive(Debug, Error)]
pub enum StepError {
  #[error(transparent)]
  Filesystem(#[from] FilesystemError),

  #[error(transparent)]
  Compilation(#[from] CompileError),

  #[error(transparent)]
  Packaging(#[from] PackagingError),

  #[error(transparent)]
  Publish(#[from] PublishError),

  #[error(transparent)]
  Layout(#[from] LayoutError),

  /// A step was attempted from the wrong state.
  #[error("cannot run {step} from state {state:?}")]
  InvalidState { step: Step, state: PipelineState },
}

impl StepError {
  /// The error kind as shown to users.
  pub fn kind(&self) -> &'static str {
    match self {
      StepError::Filesystem(_) => "FilesystemError",
      StepError::Compilation(_) => "CompilationError",
      StepError::Packaging(_) => "PackagingError",
      StepError::Publish(_) => "PublishError",
      StepError::Layout(_) => "LayoutError",
      StepError::InvalidState { .. } => "InvalidState",
    }
  }
}

/// A pipeline failure: the step that failed and why.
#[derive(Debug, Error)]
#[error("{step} failed: {error}")]
pub struct PipelineError {
  pub step: Step,
  #[source]
  pub error: StepError,
}

impl PipelineError {
  pub fn kind(&self) -> &'static str {
    self.error.kind()
  }
}

/// Configured paths that cannot work together.
#[derive(Debug, Error)]
pub enum LayoutError {
  /// A second run would package the first run's archive.
  #[error("archive {} is inside the staging directory {}", .archive.display(), .staging.display())]
  ArchiveInStaging { archive: PathBuf, staging: PathBuf },

  /// Publishing the distribution directory would not ship the archive.
  #[error("archive {} is outside the distribution directory {}", .archive.display(), .dist.display())]
  ArchiveOutsideDist { archive: PathBuf, dist: PathBuf },
}

/// Every path a run touches, resolved against the project root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Layout {
  pub root: PathBuf,
  pub source_dir: PathBuf,
  pub resource_dir: PathBuf,
  pub staging_dir: PathBuf,
  pub dist_dir: PathBuf,
  pub archive_path: PathBuf,
  pub manifest_path: PathBuf,
  /// Member selection pattern, see [`crate::archive::Selector`].
  pub pattern: String,
}

impl Layout {
  /// The reference layout rooted at `root`.
  pub fn new(root: impl Into<PathBuf>) -> Self {
    let root = root.into();
    Self {
      source_dir: root.join("src"),
      resource_dir: root.join("res"),
      staging_dir: root.join("build").join("classes"),
      dist_dir: root.join("dist"),
      archive_path: root.join("dist").join("app.jar"),
      manifest_path: root.join("manifest.mf"),
      pattern: MATCH_ALL.to_string(),
      root,
    }
  }

  /// Resolve `path` against the root; absolute paths are kept as-is.
  /// `.` and `..` are folded either way.
  pub fn resolve(&self, path: &Path) -> PathBuf {
    if path.is_absolute() {
      normalize_path(path)
    } else {
      normalize_path(&self.root.join(path))
    }
  }

  /// Reject layouts where the archive would feed back into the next run or
  /// miss the published directory.
  pub fn check(&self) -> Result<(), LayoutError> {
    let archive = normalize_path(&self.archive_path);
    let staging = normalize_path(&self.staging_dir);
    let dist = normalize_path(&self.dist_dir);

    if archive.starts_with(&staging) {
      return Err(LayoutError::ArchiveInStaging { archive, staging });
    }
    if archive == dist || !archive.starts_with(&dist) {
      return Err(LayoutError::ArchiveOutsideDist { archive, dist });
    }
    Ok(())
  }

  /// Directories the prepare step creates, deduplicated, in creation order.
  pub fn output_dirs(&self) -> Vec<PathBuf> {
    let mut dirs = vec![self.staging_dir.clone(), self.dist_dir.clone()];
    if let Some(parent) = self.archive_path.parent() {
      dirs.push(parent.to_path_buf());
    }
    let mut seen = Vec::with_capacity(dirs.len());
    dirs.retain(|dir| {
      if seen.contains(dir) {
        false
      } else {
        seen.push(dir.clone());
        true
      }
    });
    dirs
  }
}

/// Everything a successful run produced.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
  pub state: PipelineState,
  /// Directories created by the prepare step.
  pub created_dirs: Vec<PathBuf>,
  pub compile: CompileOutput,
  pub merge: MergeReport,
  pub archive: ArchiveSummary,
  pub publish: PublishReceipt,
}
