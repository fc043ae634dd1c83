//! Pipeline configuration.
//!
//! Configuration lives in `buildpipe.toml` at the project root (or wherever
//! `BUILDPIPE_CONFIG` / `--config` points). Every key is optional; missing
//! keys fall back to the reference layout:
//!
//! ```toml
//! [paths]
//! source = "src"
//! resources = "res"
//! staging = "build/classes"
//! dist = "dist"
//! archive = "dist/app.jar"
//! manifest = "manifest.mf"
//!
//! [archive]
//! pattern = ".*"
//!
//! [compiler]
//! command = "javac -d \"$out\" $(find \"$src\" -name '*.java')"
//! timeout = "10m"
//! fail_on_diagnostics = true
//!
//! [publish]
//! directory = "/srv/releases"   # or: command = "scp \"$dist\"/*.jar host:"
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::archive::MATCH_ALL;
use crate::compile::CommandCompiler;
use crate::consts::{CONFIG_ENV_VAR, CONFIG_FILENAME, DEFAULT_COMPILE_COMMAND};
use crate::pipeline::{Layout, LayoutError};
use crate::publish::{CommandPublisher, ConfiguredPublisher, DirectoryPublisher};

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
  /// An explicitly requested config file does not exist.
  #[error("config file not found: {}", .0.display())]
  NotFound(PathBuf),

  #[error("failed to read config {}: {source}", .path.display())]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to parse config {}: {source}", .path.display())]
  Parse {
    path: PathBuf,
    #[source]
    source: toml::de::Error,
  },

  #[error("invalid timeout {value:?} in [{section}]: {source}")]
  InvalidTimeout {
    section: &'static str,
    value: String,
    #[source]
    source: humantime::DurationError,
  },

  #[error("no publish target configured; set [publish] directory or command")]
  NoPublishTarget,

  #[error("[publish] sets both directory and command; choose one")]
  ConflictingPublishTargets,

  #[error("invalid [paths]: {0}")]
  Layout(#[from] LayoutError),

  /// Each run would copy the previous run's published copy again.
  #[error(
    "[publish] directory {} is inside the distribution directory {}",
    .destination.display(),
    .dist.display()
  )]
  PublishInsideDist { destination: PathBuf, dist: PathBuf },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
  pub paths: PathsConfig,
  pub archive: ArchiveConfig,
  pub compiler: CompilerConfig,
  pub publish: PublishConfig,
}

/// `[paths]`, relative entries resolve against the project root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsConfig {
  pub source: PathBuf,
  pub resources: PathBuf,
  pub staging: PathBuf,
  pub dist: PathBuf,
  pub archive: PathBuf,
  pub manifest: PathBuf,
}

impl Default for PathsConfig {
  fn default() -> Self {
    Self {
      source: PathBuf::from("src"),
      resources: PathBuf::from("res"),
      staging: PathBuf::from("build/classes"),
      dist: PathBuf::from("dist"),
      archive: PathBuf::from("dist/app.jar"),
      manifest: PathBuf::from("manifest.mf"),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ArchiveConfig {
  pub pattern: String,
}

impl Default for ArchiveConfig {
  fn default() -> Self {
    Self {
      pattern: MATCH_ALL.to_string(),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompilerConfig {
  pub command: String,
  pub shell: Option<String>,
  /// Humantime duration, e.g. `"90s"` or `"10m"`.
  pub timeout: Option<String>,
  pub fail_on_diagnostics: bool,
}

impl Default for CompilerConfig {
  fn default() -> Self {
    Self {
      command: DEFAULT_COMPILE_COMMAND.to_string(),
      shell: None,
      timeout: None,
      fail_on_diagnostics: true,
    }
  }
}

/// `[publish]`, exactly one of `directory` or `command` must be set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PublishConfig {
  pub directory: Option<PathBuf>,
  pub command: Option<String>,
  pub shell: Option<String>,
  pub timeout: Option<String>,
}

/// Pick the config file for `root`.
///
/// Precedence: `explicit`, then `BUILDPIPE_CONFIG`, then `root/buildpipe.toml`.
/// The boolean is true when the file was requested and must exist.
pub fn config_path(root: &Path, explicit: Option<&Path>) -> (PathBuf, bool) {
  if let Some(path) = explicit {
    return (path.to_path_buf(), true);
  }
  if let Some(path) = std::env::var_os(CONFIG_ENV_VAR).filter(|v| !v.is_empty()) {
    return (PathBuf::from(path), true);
  }
  (root.join(CONFIG_FILENAME), false)
}

fn parse_timeout(section: &'static str, value: Option<&str>) -> Result<Option<Duration>, ConfigError> {
  value
    .map(|v| {
      humantime::parse_duration(v).map_err(|source| ConfigError::InvalidTimeout {
        section,
        value: v.to_string(),
        source,
      })
    })
    .transpose()
}

impl Config {
  /// Parse a config file.
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| {
      if source.kind() == io::ErrorKind::NotFound {
        ConfigError::NotFound(path.to_path_buf())
      } else {
        ConfigError::Read {
          path: path.to_path_buf(),
          source,
        }
      }
    })?;
    Self::parse(&content, path)
  }

  /// Parse config text; `origin` is only used in error messages.
  pub fn parse(content: &str, origin: &Path) -> Result<Self, ConfigError> {
    toml::from_str(content).map_err(|source| ConfigError::Parse {
      path: origin.to_path_buf(),
      source,
    })
  }

  /// Load the config that applies to `root`, falling back to defaults when
  /// no file was requested and `root/buildpipe.toml` does not exist.
  pub fn discover(root: &Path, explicit: Option<&Path>) -> Result<Self, ConfigError> {
    let (path, required) = config_path(root, explicit);
    if !required && !path.exists() {
      debug!(path = %path.display(), "no config file, using defaults");
      return Ok(Self::default());
    }
    debug!(path = %path.display(), "loading config");
    Self::load(&path)
  }

  /// Resolve every path against `root` and check they fit together.
  pub fn layout(&self, root: &Path) -> Result<Layout, ConfigError> {
    let base = Layout::new(root);
    let layout = Layout {
      source_dir: base.resolve(&self.paths.source),
      resource_dir: base.resolve(&self.paths.resources),
      staging_dir: base.resolve(&self.paths.staging),
      dist_dir: base.resolve(&self.paths.dist),
      archive_path: base.resolve(&self.paths.archive),
      manifest_path: base.resolve(&self.paths.manifest),
      pattern: self.archive.pattern.clone(),
      root: base.root,
    };
    layout.check()?;
    Ok(layout)
  }

  /// Build the compiler described by `[compiler]`.
  pub fn compiler(&self, root: &Path) -> Result<CommandCompiler, ConfigError> {
    let mut compiler = CommandCompiler::new(&self.compiler.command, root);
    compiler.shell = self.compiler.shell.clone();
    compiler.timeout = parse_timeout("compiler", self.compiler.timeout.as_deref())?;
    compiler.fail_on_diagnostics = self.compiler.fail_on_diagnostics;
    Ok(compiler)
  }

  /// Build the publisher described by `[publish]`.
  pub fn publisher(&self, root: &Path) -> Result<ConfiguredPublisher, ConfigError> {
    let publish = &self.publish;
    match (&publish.directory, &publish.command) {
      (Some(_), Some(_)) => Err(ConfigError::ConflictingPublishTargets),
      (None, None) => Err(ConfigError::NoPublishTarget),
      (Some(directory), None) => {
        let base = Layout::new(root);
        let destination = base.resolve(directory);
        let dist = base.resolve(&self.paths.dist);
        if destination.starts_with(&dist) {
          return Err(ConfigError::PublishInsideDist { destination, dist });
        }
        Ok(ConfiguredPublisher::Directory(DirectoryPublisher::new(destination)))
      }
      (None, Some(command)) => {
        let mut publisher = CommandPublisher::new(command, root);
        publisher.shell = publish.shell.clone();
        publisher.timeout = parse_timeout("publish", publish.timeout.as_deref())?;
        Ok(ConfiguredPublisher::Command(publisher))
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serial_test::serial;
  use tempfile::TempDir;

  #[test]
  fn empty_config_uses_reference_layout() {
    let config = Config::parse("", Path::new("buildpipe.toml")).unwrap();
    assert_eq!(config, Config::default());
    assert_eq!(config.layout(Path::new("/p")).unwrap(), Layout::new("/p"));
  }

  #[test]
  fn parses_full_config() {
    let content = r#"
      [paths]
      source = "java"
      archive = "out/editor.jar"

      [archive]
      pattern = '.*\.class'

      [compiler]
      command = "make classes"
      timeout = "90s"
      fail_on_diagnostics = false

      [publish]
      command = "upload $dist"
      timeout = "2m"
    "#;
    let config = Config::parse(content, Path::new("buildpipe.toml")).unwrap();

    let layout = config.layout(Path::new("/p")).unwrap();
    assert_eq!(layout.source_dir, PathBuf::from("/p/java"));
    assert_eq!(layout.resource_dir, PathBuf::from("/p/res"));
    assert_eq!(layout.archive_path, PathBuf::from("/p/out/editor.jar"));
    assert_eq!(layout.pattern, r".*\.class");

    let compiler = config.compiler(Path::new("/p")).unwrap();
    assert_eq!(compiler.command, "make classes");
    assert_eq!(compiler.timeout, Some(Duration::from_secs(90)));
    assert!(!compiler.fail_on_diagnostics);

    match config.publisher(Path::new("/p")).unwrap() {
      ConfiguredPublisher::Command(publisher) => {
        assert_eq!(publisher.command, "upload $dist");
        assert_eq!(publisher.timeout, Some(Duration::from_secs(120)));
      }
      other => panic!("expected command publisher, got {:?}", other),
    }
  }

  #[test]
  #[cfg(unix)]
  fn absolute_paths_are_kept() {
    let config = Config::parse("[paths]\nmanifest = \"/etc/app/manifest.mf\"", Path::new("x")).unwrap();
    assert_eq!(
      config.layout(Path::new("/p")).unwrap().manifest_path,
      PathBuf::from("/etc/app/manifest.mf")
    );
  }

  #[test]
  fn archive_in_staging_is_rejected() {
    let config = Config::parse("[paths]\narchive = \"build/classes/app.jar\"", Path::new("x")).unwrap();
    assert!(matches!(
      config.layout(Path::new("/p")),
      Err(ConfigError::Layout(LayoutError::ArchiveInStaging { .. }))
    ));
  }

  #[test]
  fn archive_outside_dist_is_rejected() {
    let config = Config::parse("[paths]\narchive = \"out/app.jar\"", Path::new("x")).unwrap();
    assert!(matches!(
      config.layout(Path::new("/p")),
      Err(ConfigError::Layout(LayoutError::ArchiveOutsideDist { .. }))
    ));

    let moved = Config::parse("[paths]\ndist = \"out\"\narchive = \"out/app.jar\"", Path::new("x")).unwrap();
    assert!(moved.layout(Path::new("/p")).is_ok());
  }

  #[test]
  fn publish_directory_inside_dist_is_rejected() {
    let config = Config::parse("[publish]\ndirectory = \"dist/releases\"", Path::new("x")).unwrap();
    assert!(matches!(
      config.publisher(Path::new("/p")),
      Err(ConfigError::PublishInsideDist { .. })
    ));

    let beside = Config::parse("[publish]\ndirectory = \"dist/../releases\"", Path::new("x")).unwrap();
    assert!(beside.publisher(Path::new("/p")).is_ok());
  }

  #[test]
  fn unknown_keys_are_rejected() {
    let result = Config::parse("[paths]\nsources = \"src\"", Path::new("buildpipe.toml"));
    assert!(matches!(result, Err(ConfigError::Parse { .. })));
  }

  #[test]
  fn invalid_timeout_is_rejected() {
    let config = Config::parse("[compiler]\ntimeout = \"soon\"", Path::new("x")).unwrap();
    assert!(matches!(
      config.compiler(Path::new("/p")),
      Err(ConfigError::InvalidTimeout { section: "compiler", .. })
    ));
  }

  #[test]
  fn publish_target_is_required() {
    let config = Config::default();
    assert!(matches!(
      config.publisher(Path::new("/p")),
      Err(ConfigError::NoPublishTarget)
    ));
  }

  #[test]
  fn publish_targets_conflict() {
    let config = Config::parse("[publish]\ndirectory = \"out\"\ncommand = \"true\"", Path::new("x")).unwrap();
    assert!(matches!(
      config.publisher(Path::new("/p")),
      Err(ConfigError::ConflictingPublishTargets)
    ));
  }

  #[test]
  fn relative_publish_directory_resolves_against_root() {
    let config = Config::parse("[publish]\ndirectory = \"releases\"", Path::new("x")).unwrap();
    match config.publisher(Path::new("/p")).unwrap() {
      ConfiguredPublisher::Directory(publisher) => {
        assert_eq!(publisher.destination, PathBuf::from("/p/releases"));
      }
      other => panic!("expected directory publisher, got {:?}", other),
    }
  }

  #[test]
  #[serial]
  fn discover_without_file_uses_defaults() {
    let temp = TempDir::new().unwrap();
    temp_env::with_var(CONFIG_ENV_VAR, None::<&str>, || {
      let config = Config::discover(temp.path(), None).unwrap();
      assert_eq!(config, Config::default());
    });
  }

  #[test]
  #[serial]
  fn discover_reads_root_file() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join(CONFIG_FILENAME), "[archive]\npattern = 'com/.*'").unwrap();
    temp_env::with_var(CONFIG_ENV_VAR, None::<&str>, || {
      let config = Config::discover(temp.path(), None).unwrap();
      assert_eq!(config.archive.pattern, "com/.*");
    });
  }

  #[test]
  #[serial]
  fn env_var_overrides_root_file() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join(CONFIG_FILENAME), "[archive]\npattern = 'root'").unwrap();
    let other = temp.path().join("ci.toml");
    fs::write(&other, "[archive]\npattern = 'ci'").unwrap();

    temp_env::with_var(CONFIG_ENV_VAR, Some(&other), || {
      let config = Config::discover(temp.path(), None).unwrap();
      assert_eq!(config.archive.pattern, "ci");
    });
  }

  #[test]
  #[serial]
  fn explicit_missing_file_is_an_error() {
    let temp = TempDir::new().unwrap();
    temp_env::with_var(CONFIG_ENV_VAR, None::<&str>, || {
      let result = Config::discover(temp.path(), Some(&temp.path().join("missing.toml")));
      assert!(matches!(result, Err(ConfigError::NotFound(_))));
    });
  }
}
