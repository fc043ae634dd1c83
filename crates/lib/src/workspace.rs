//! Output directory preparation.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::fs::FilesystemError;

/// Ensure every directory in `dirs` exists, creating intermediate
/// directories as needed.
///
/// Returns the directories that were created by this call. Directories that
/// already exist are left alone, so calling this twice with the same input
/// returns an empty list the second time.
pub fn prepare_dirs<P: AsRef<Path>>(dirs: &[P]) -> Result<Vec<PathBuf>, FilesystemError> {
  let mut created = Vec::new();

  for dir in dirs {
    let dir = dir.as_ref();

    if dir.is_dir() {
      debug!(path = %dir.display(), "directory already exists");
      continue;
    }

    // Either the path itself or one of its ancestors is a regular file.
    if let Some(blocker) = dir.ancestors().find(|p| p.exists() && !p.is_dir()) {
      return Err(FilesystemError::NotADirectory {
        path: blocker.to_path_buf(),
      });
    }

    fs::create_dir_all(dir).map_err(|source| FilesystemError::CreateDir {
      path: dir.to_path_buf(),
      source,
    })?;
    info!(path = %dir.display(), "created directory");
    created.push(dir.to_path_buf());
  }

  Ok(created)
}
