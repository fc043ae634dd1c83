use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod output;
mod run;

use output::{OutputFormat, print_error};

/// buildpipe - compile, merge resources, package and publish in one pass
#[derive(Parser, Debug)]
#[command(name = "buildpipe")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
  /// Project root; relative paths in the config resolve against it
  #[arg(short, long, default_value = ".")]
  pub root: PathBuf,

  /// Config file (default: <root>/buildpipe.toml, or $BUILDPIPE_CONFIG)
  #[arg(short, long)]
  pub config: Option<PathBuf>,

  /// Archive member selection pattern (regular expression over relative paths)
  #[arg(long)]
  pub pattern: Option<String>,

  /// Archive target path
  #[arg(long)]
  pub archive: Option<PathBuf>,

  /// Manifest descriptor embedded in the archive
  #[arg(long)]
  pub manifest: Option<PathBuf>,

  /// Publish by copying the distribution directory here
  #[arg(long, conflicts_with = "publish_cmd")]
  pub publish_dir: Option<PathBuf>,

  /// Publish by running this shell command ($dist is the distribution directory)
  #[arg(long)]
  pub publish_cmd: Option<String>,

  /// Output format
  #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
  pub output: OutputFormat,

  /// Enable verbose output
  #[arg(short, long)]
  pub verbose: bool,
}

fn main() -> ExitCode {
  let cli = Cli::parse();

  let default_level = if cli.verbose { "debug" } else { "warn" };
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  match run::cmd_run(&cli) {
    Ok(code) => code,
    Err(err) => {
      print_error(&format!("{:#}", err));
      ExitCode::from(2)
    }
  }
}
