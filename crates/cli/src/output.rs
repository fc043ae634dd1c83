//! Terminal and JSON rendering of a pipeline run.
//!
//! Step lines go to stdout; warnings and failures go to stderr so a JSON
//! report on stdout stays parseable.

use std::time::Duration;

use anyhow::Context;
use clap::ValueEnum;
use owo_colors::{OwoColorize, Stream};
use serde::Serialize;

use buildpipe_lib::pipeline::{PipelineError, PipelineReport, PipelineState, Step};

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
  #[default]
  Text,
  Json,
}

impl OutputFormat {
  pub fn is_json(self) -> bool {
    matches!(self, OutputFormat::Json)
  }
}

pub mod symbols {
  pub const SUCCESS: &str = "✓";
  pub const ERROR: &str = "✗";
  pub const WARNING: &str = "⚠";
}

/// JSON body written when a step fails.
#[derive(Debug, Serialize)]
pub struct FailureReport {
  pub state: PipelineState,
  pub step: Step,
  pub kind: &'static str,
  pub message: String,
}

impl FailureReport {
  pub fn new(state: PipelineState, err: &PipelineError) -> Self {
    Self {
      state,
      step: err.step,
      kind: err.kind(),
      message: err.error.to_string(),
    }
  }
}

/// First twelve hex digits, enough to tell archives apart at a glance.
pub fn truncate_hash(hash: &str) -> &str {
  hash.get(..12).unwrap_or(hash)
}

/// Archive size in the largest whole unit that keeps one decimal.
pub fn format_bytes(bytes: u64) -> String {
  const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];

  if bytes < 1024 {
    return format!("{} B", bytes);
  }
  let mut value = bytes as f64 / 1024.0;
  let mut unit = 0;
  while value >= 1024.0 && unit < UNITS.len() - 1 {
    value /= 1024.0;
    unit += 1;
  }
  format!("{:.1} {}", value, UNITS[unit])
}

/// Wall-clock time rounded to milliseconds.
pub fn format_duration(duration: Duration) -> String {
  let rounded = Duration::from_millis(duration.as_millis() as u64);
  humantime::format_duration(rounded).to_string()
}

pub fn print_step(step: Step, detail: &str) {
  let label = format!("{:<8}", step.as_str());
  println!(
    "{} {} {}",
    symbols::SUCCESS.if_supports_color(Stream::Stdout, |s| s.green()),
    label.if_supports_color(Stream::Stdout, |s| s.bold()),
    detail
  );
}

pub fn print_error(message: &str) {
  eprintln!(
    "{} {}",
    symbols::ERROR.if_supports_color(Stream::Stderr, |s| s.red()),
    message.if_supports_color(Stream::Stderr, |s| s.red())
  );
}

pub fn print_warning(message: &str) {
  eprintln!(
    "{} {}",
    symbols::WARNING.if_supports_color(Stream::Stderr, |s| s.yellow()),
    message.if_supports_color(Stream::Stderr, |s| s.yellow())
  );
}

fn print_stat(label: &str, value: &str) {
  println!(
    "  {}: {}",
    label.if_supports_color(Stream::Stdout, |s| s.dimmed()),
    value
  );
}

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
  let json = serde_json::to_string_pretty(value).context("Failed to serialize to JSON")?;
  println!("{}", json);
  Ok(())
}

/// One line per step, then the archive details.
pub fn print_report(report: &PipelineReport, took: Duration) {
  print_step(
    Step::Prepare,
    &format!("{} directories created", report.created_dirs.len()),
  );

  if let Some(warnings) = &report.compile.warnings {
    print_warning(&format!("compiler diagnostics:\n{}", warnings));
  }
  print_step(Step::Compile, "ok");

  for file in &report.merge.overwritten {
    print_warning(&format!("resource {} replaced a compiled file", file));
  }
  print_step(
    Step::Merge,
    &format!(
      "{} files ({} overwritten)",
      report.merge.copied.len(),
      report.merge.overwritten.len()
    ),
  );

  print_step(
    Step::Package,
    &format!(
      "{} members, {}",
      report.archive.members.len(),
      format_bytes(report.archive.size)
    ),
  );
  print_step(Step::Publish, &report.publish.destination);

  println!();
  print_stat("Archive", &report.archive.path.display().to_string());
  print_stat("SHA-256", truncate_hash(&report.archive.sha256.0));
  print_stat("Elapsed", &format_duration(took));
}

/// `<step> failed [<kind>]: <message>` on stderr.
pub fn print_failure(err: &PipelineError) {
  print_error(&format!("{} failed [{}]: {}", err.step, err.kind(), err.error));
}
