//! Pipeline orchestration.
//!
//! A run executes five steps in a fixed order, each consuming the filesystem
//! state left by the previous one:
//!
//! 1. Prepare: create the staging and distribution directories
//! 2. Compile: run the compiler from the source tree into staging
//! 3. Merge: copy static resources over the compiler output
//! 4. Package: build the archive from staging plus the manifest
//! 5. Publish: hand the distribution directory to the publisher
//!
//! The first failure moves the pipeline to [`PipelineState::Failed`] and ends
//! the run. Nothing written before the failure is cleaned up.

mod types;

pub use types::{Layout, LayoutError, PipelineError, PipelineReport, PipelineState, Step, StepError};

use std::path::PathBuf;
use std::time::Instant;

use tracing::{error, info};

use crate::archive::{ArchiveSummary, PackagingError, Selector, build_archive};
use crate::compile::{CompileOutput, Compiler};
use crate::publish::{PublishReceipt, Publisher};
use crate::resources::{MergeReport, merge_resources};
use crate::workspace::prepare_dirs;

/// A single pipeline run.
///
/// Owns the resolved layout, the two external collaborators, and the one
/// state variable threaded through the steps.
#[derive(Debug)]
pub struct Pipeline<C, P> {
  layout: Layout,
  compiler: C,
  publisher: P,
  state: PipelineState,
}

impl<C: Compiler, P: Publisher> Pipeline<C, P> {
  pub fn new(layout: Layout, compiler: C, publisher: P) -> Self {
    Self {
      layout,
      compiler,
      publisher,
      state: PipelineState::Init,
    }
  }

  pub fn state(&self) -> PipelineState {
    self.state
  }

  pub fn layout(&self) -> &Layout {
    &self.layout
  }

  /// Run every step in order.
  ///
  /// Only a fresh pipeline can run; a finished or failed one returns
  /// [`StepError::InvalidState`] and leaves its state untouched.
  pub async fn run(&mut self) -> Result<PipelineReport, PipelineError> {
    let started = Instant::now();

    let created_dirs = self.prepare()?;
    let compile = self.compile().await?;
    let merge = self.merge()?;
    let archive = self.package()?;
    let publish = self.publish().await?;

    info!(elapsed = ?started.elapsed(), archive = %archive.path.display(), "pipeline finished");

    Ok(PipelineReport {
      state: self.state,
      created_dirs,
      compile,
      merge,
      archive,
      publish,
    })
  }

  /// Check the layout, then create the output directory tree.
  pub fn prepare(&mut self) -> Result<Vec<PathBuf>, PipelineError> {
    let step = self.begin(Step::Prepare)?;
    let result = match self.layout.check() {
      Ok(()) => prepare_dirs(&self.layout.output_dirs()).map_err(StepError::from),
      Err(err) => Err(StepError::from(err)),
    };
    self.finish(step, result)
  }

  /// Compile the source tree into the staging directory.
  pub async fn compile(&mut self) -> Result<CompileOutput, PipelineError> {
    let step = self.begin(Step::Compile)?;
    let result = self
      .compiler
      .compile(&self.layout.source_dir, &self.layout.staging_dir)
      .await;
    self.finish(step, result)
  }

  /// Copy resources into the staging directory.
  pub fn merge(&mut self) -> Result<MergeReport, PipelineError> {
    let step = self.begin(Step::Merge)?;
    let result = merge_resources(&self.layout.resource_dir, &self.layout.staging_dir);
    self.finish(step, result)
  }

  /// Build the archive.
  pub fn package(&mut self) -> Result<ArchiveSummary, PipelineError> {
    let step = self.begin(Step::Package)?;
    let result = Selector::new(&self.layout.pattern)
      .map_err(|source| PackagingError::InvalidPattern {
        pattern: self.layout.pattern.clone(),
        source,
      })
      .and_then(|selector| {
        build_archive(
          &self.layout.staging_dir,
          &selector,
          &self.layout.archive_path,
          &self.layout.manifest_path,
        )
      });
    self.finish(step, result)
  }

  /// Hand the distribution directory to the publisher.
  pub async fn publish(&mut self) -> Result<PublishReceipt, PipelineError> {
    let step = self.begin(Step::Publish)?;
    let result = self.publisher.publish(&self.layout.dist_dir).await;
    self.finish(step, result)
  }

  fn begin(&self, step: Step) -> Result<Step, PipelineError> {
    if self.state != step.requires() {
      return Err(PipelineError {
        step,
        error: StepError::InvalidState {
          step,
          state: self.state,
        },
      });
    }
    info!(step = %step, "starting step");
    Ok(step)
  }

  fn finish<T, E: Into<StepError>>(&mut self, step: Step, result: Result<T, E>) -> Result<T, PipelineError> {
    match result {
      Ok(value) => {
        self.state = step.produces();
        info!(step = %step, state = ?self.state, "step complete");
        Ok(value)
      }
      Err(err) => {
        let error = err.into();
        self.state = PipelineState::Failed(step);
        error!(step = %step, kind = error.kind(), error = %error, "step failed");
        Err(PipelineError { step, error })
      }
    }
  }
}
