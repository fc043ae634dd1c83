//! Filesystem helpers shared by the pipeline steps.
//!
//! Directory walks here are always sorted by file name so that every step
//! observes the tree in the same order on every platform.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use thiserror::Error;
use tracing::{debug, trace};
use walkdir::WalkDir;

/// Path and permission failures.
#[derive(Debug, Error)]
pub enum FilesystemError {
  /// A path component exists but is a file, not a directory.
  #[error("path exists but is not a directory: {}", .path.display())]
  NotADirectory { path: PathBuf },

  #[error("failed to create directory {}: {source}", .path.display())]
  CreateDir {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  /// A directory that a step reads from does not exist.
  #[error("source directory not found: {}", .path.display())]
  MissingSource { path: PathBuf },

  #[error("failed to walk {}: {message}", .path.display())]
  Walk { path: PathBuf, message: String },

  #[error("failed to copy {} to {}: {source}", .from.display(), .to.display())]
  Copy {
    from: PathBuf,
    to: PathBuf,
    #[source]
    source: io::Error,
  },
}

/// A file copied by [`copy_tree`].
#[derive(Debug, Clone)]
pub struct CopiedFile {
  /// Path relative to the copy root, `/`-separated.
  pub relative: String,
  /// Whether a file already existed at the destination.
  pub replaced: bool,
}

/// Resolve `.` and `..` components without touching the filesystem.
///
/// Paths that do not exist yet (the staging directory before the first run)
/// still compare correctly with `starts_with` after this.
pub fn normalize_path(path: &Path) -> PathBuf {
  let mut out = PathBuf::new();
  for component in path.components() {
    match component {
      Component::CurDir => {}
      Component::ParentDir => {
        if !out.pop() {
          out.push(component);
        }
      }
      other => out.push(other),
    }
  }
  out
}

/// Render `path` relative to `root` with `/` separators on every platform.
///
/// Returns `None` when `path` is not under `root` or is not valid UTF-8.
pub fn relative_slash_path(root: &Path, path: &Path) -> Option<String> {
  let rel = path.strip_prefix(root).ok()?;
  let parts: Option<Vec<&str>> = rel.components().map(|c| c.as_os_str().to_str()).collect();
  Some(parts?.join("/"))
}

/// Collect every regular file under `root` as `(relative, absolute)` pairs,
/// sorted lexicographically by relative path. Symlinks are followed.
pub fn list_files(root: &Path) -> Result<Vec<(String, PathBuf)>, FilesystemError> {
  let mut files = Vec::new();

  for entry in WalkDir::new(root).follow_links(true).sort_by_file_name() {
    let entry = entry.map_err(|e| FilesystemError::Walk {
      path: root.to_path_buf(),
      message: e.to_string(),
    })?;

    if !entry.file_type().is_file() {
      continue;
    }

    let relative = relative_slash_path(root, entry.path()).ok_or_else(|| FilesystemError::Walk {
      path: entry.path().to_path_buf(),
      message: "path is not valid UTF-8".to_string(),
    })?;
    files.push((relative, entry.into_path()));
  }

  // Walk order sorts per directory; the byte order of full paths is what callers rely on.
  files.sort_by(|a, b| a.0.cmp(&b.0));
  Ok(files)
}

/// Copy every file under `src` into `dst`, preserving relative paths.
///
/// Existing destination files are overwritten unconditionally; each
/// returned [`CopiedFile`] records whether that happened.
pub fn copy_tree(src: &Path, dst: &Path) -> Result<Vec<CopiedFile>, FilesystemError> {
  if !src.is_dir() {
    return Err(FilesystemError::MissingSource { path: src.to_path_buf() });
  }

  let mut copied = Vec::new();

  for (relative, from) in list_files(src)? {
    let to = dst.join(&relative);

    if let Some(parent) = to.parent() {
      fs::create_dir_all(parent).map_err(|source| FilesystemError::CreateDir {
        path: parent.to_path_buf(),
        source,
      })?;
    }

    let replaced = to.exists();
    fs::copy(&from, &to).map_err(|source| FilesystemError::Copy {
      from: from.clone(),
      to: to.clone(),
      source,
    })?;
    trace!(file = %relative, replaced, "copied");

    copied.push(CopiedFile { relative, replaced });
  }

  debug!(src = %src.display(), dst = %dst.display(), files = copied.len(), "copied tree");
  Ok(copied)
}
