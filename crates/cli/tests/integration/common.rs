//! Shared test helpers for CLI integration tests.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use tempfile::TempDir;

/// Get path to a fixture file.
pub fn fixture_path(name: &str) -> PathBuf {
  PathBuf::from(env!("CARGO_MANIFEST_DIR"))
    .join("tests")
    .join("fixtures")
    .join(name)
}

/// Read fixture content.
pub fn fixture_content(name: &str) -> String {
  std::fs::read_to_string(fixture_path(name)).unwrap_or_else(|e| panic!("Failed to load fixture {}: {}", name, e))
}

/// Isolated project.
///
/// Each test gets its own temporary project root with `src/`, `res/`, a
/// manifest and a `buildpipe.toml`.
pub struct TestEnv {
  pub temp: TempDir,
}

impl TestEnv {
  /// Create a project whose `buildpipe.toml` is the named fixture.
  ///
  /// The project holds `src/Foo.java`, `res/icon.png` and `manifest.mf`.
  pub fn from_fixture(name: &str) -> Self {
    let env = Self::empty();
    env.write_file("buildpipe.toml", &fixture_content(name));
    env.write_file("manifest.mf", &fixture_content("manifest.mf"));
    env.write_file("src/Foo.java", "class Foo {}");
    env.write_file("res/icon.png", "png bytes");
    env
  }

  /// Create an empty project.
  pub fn empty() -> Self {
    Self {
      temp: TempDir::new().unwrap(),
    }
  }

  pub fn root(&self) -> &Path {
    self.temp.path()
  }

  /// Write a file relative to the project root.
  pub fn write_file(&self, relative_path: &str, content: &str) {
    let path = self.root().join(relative_path);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
  }

  pub fn archive_path(&self) -> PathBuf {
    self.root().join("dist").join("app.jar")
  }

  /// Get a pre-configured Command for the buildpipe binary, rooted at the project.
  pub fn cmd(&self) -> Command {
    let mut cmd: Command = cargo_bin_cmd!("buildpipe");
    cmd.arg("--root").arg(self.root());
    cmd.env_remove("BUILDPIPE_CONFIG");
    cmd.env_remove("RUST_LOG");
    cmd
  }
}

/// Member names of an archive, in archive order.
pub fn archive_members(path: &Path) -> Vec<String> {
  let mut archive = zip::ZipArchive::new(File::open(path).unwrap()).unwrap();
  (0..archive.len())
    .map(|i| archive.by_index(i).unwrap().name().to_string())
    .collect()
}

/// Content of one archive member.
pub fn archive_member(path: &Path, name: &str) -> String {
  let mut archive = zip::ZipArchive::new(File::open(path).unwrap()).unwrap();
  let mut entry = archive.by_name(name).unwrap();
  let mut content = String::new();
  entry.read_to_string(&mut content).unwrap();
  content
}
