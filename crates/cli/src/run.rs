//! The single `buildpipe` invocation.
//!
//! Loads configuration, applies command-line overrides, and runs the whole
//! pipeline once: prepare, compile, merge, package, publish.

use std::process::ExitCode;
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::debug;

use buildpipe_lib::config::Config;
use buildpipe_lib::pipeline::Pipeline;

use crate::Cli;
use crate::output::{FailureReport, print_failure, print_json, print_report};

/// Execute the pipeline.
///
/// Returns `ExitCode::FAILURE` when a step fails; the failure has already been
/// reported. Errors returned from here are setup problems (bad root, bad
/// config) that happen before any step runs.
pub fn cmd_run(cli: &Cli) -> Result<ExitCode> {
  let root = dunce::canonicalize(&cli.root)
    .with_context(|| format!("Project root not found: {}", cli.root.display()))?;

  let mut config = Config::discover(&root, cli.config.as_deref()).context("Failed to load config")?;
  apply_overrides(&mut config, cli);
  debug!(?config, "effective config");

  let layout = config.layout(&root).context("Invalid [paths] config")?;
  let compiler = config.compiler(&root).context("Invalid [compiler] config")?;
  let publisher = config.publisher(&root).context("Invalid [publish] config")?;

  let rt = tokio::runtime::Builder::new_current_thread()
    .enable_all()
    .build()
    .context("Failed to create async runtime")?;

  let started = Instant::now();
  let mut pipeline = Pipeline::new(layout, compiler, publisher);

  match rt.block_on(pipeline.run()) {
    Ok(report) => {
      if cli.output.is_json() {
        print_json(&report)?;
      } else {
        print_report(&report, started.elapsed());
      }
      Ok(ExitCode::SUCCESS)
    }
    Err(err) => {
      if cli.output.is_json() {
        print_json(&FailureReport::new(pipeline.state(), &err))?;
      }
      print_failure(&err);
      Ok(ExitCode::FAILURE)
    }
  }
}

/// Command-line flags win over the config file.
fn apply_overrides(config: &mut Config, cli: &Cli) {
  if let Some(pattern) = &cli.pattern {
    config.archive.pattern = pattern.clone();
  }
  if let Some(archive) = &cli.archive {
    config.paths.archive = archive.clone();
  }
  if let Some(manifest) = &cli.manifest {
    config.paths.manifest = manifest.clone();
  }
  if let Some(dir) = &cli.publish_dir {
    config.publish.directory = Some(dir.clone());
    config.publish.command = None;
  }
  if let Some(cmd) = &cli.publish_cmd {
    config.publish.command = Some(cmd.clone());
    config.publish.directory = None;
  }
}
