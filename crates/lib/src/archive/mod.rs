//! Archive construction.
//!
//! Produces a JAR-compatible ZIP file from the staging directory. The
//! manifest always occupies `META-INF/MANIFEST.MF` as the first entry; the
//! remaining members are the staging files selected by pattern.
//!
//! # Determinism
//!
//! Two runs over identical staging contents and manifest produce identical
//! bytes:
//! - members are written in lexicographic order of their relative path
//! - every entry carries the ZIP epoch (1980-01-01 00:00:00) as mtime
//! - every entry carries the same Unix permissions
//! - nothing from the build host (owner, real mtime, walk order) is recorded

pub mod select;

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};
use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

use crate::consts::{ARCHIVE_ENTRY_MODE, MANIFEST_ENTRY};
use crate::fs::{FilesystemError, list_files};
use crate::util::hash::{ContentHash, HashError, hash_file};

pub use select::{MATCH_ALL, Selector};

/// Errors that can occur while building the archive.
#[derive(Debug, Error)]
pub enum PackagingError {
  /// The manifest descriptor does not exist.
  #[error("manifest not found: {}", .0.display())]
  ManifestMissing(PathBuf),

  #[error("failed to read manifest {}: {source}", .path.display())]
  ManifestRead {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("invalid selection pattern {pattern:?}: {source}")]
  InvalidPattern {
    pattern: String,
    #[source]
    source: regex::Error,
  },

  #[error("staging directory not found: {}", .0.display())]
  MissingStaging(PathBuf),

  #[error("failed to enumerate staging directory: {0}")]
  Staging(#[from] FilesystemError),

  /// The target path could not be opened for writing.
  #[error("cannot write archive {}: {source}", .path.display())]
  CreateArchive {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to add {}: {source}", .path.display())]
  ReadMember {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("zip error: {0}")]
  Zip(#[from] ZipError),

  #[error("failed to write archive: {0}")]
  Write(#[source] io::Error),

  #[error("failed to hash archive: {0}")]
  Hash(#[from] HashError),
}

/// Description of a finished archive.
#[derive(Debug, Clone, Serialize)]
pub struct ArchiveSummary {
  pub path: PathBuf,
  /// Member names in archive order, manifest first.
  pub members: Vec<String>,
  /// Archive size in bytes.
  pub size: u64,
  pub sha256: ContentHash,
}

fn entry_options() -> SimpleFileOptions {
  SimpleFileOptions::default()
    .compression_method(CompressionMethod::Deflated)
    .last_modified_time(DateTime::default())
    .unix_permissions(ARCHIVE_ENTRY_MODE)
}

/// Build the archive at `target`.
///
/// Every file under `staging` whose relative path matches `selector` becomes
/// a member. The manifest is read from `manifest` and stored at
/// [`MANIFEST_ENTRY`] regardless of the pattern; a staging file at that same
/// path is skipped.
///
/// Inputs are validated before `target` is touched. Once writing has started
/// a failure leaves the partial file in place.
pub fn build_archive(
  staging: &Path,
  selector: &Selector,
  target: &Path,
  manifest: &Path,
) -> Result<ArchiveSummary, PackagingError> {
  if !manifest.is_file() {
    return Err(PackagingError::ManifestMissing(manifest.to_path_buf()));
  }
  let manifest_bytes = fs::read(manifest).map_err(|source| PackagingError::ManifestRead {
    path: manifest.to_path_buf(),
    source,
  })?;

  if !staging.is_dir() {
    return Err(PackagingError::MissingStaging(staging.to_path_buf()));
  }

  let selected: Vec<(String, PathBuf)> = list_files(staging)?
    .into_iter()
    .filter(|(relative, _)| {
      if relative == MANIFEST_ENTRY {
        debug!(file = %relative, "staging file shadows the manifest slot, skipping");
        return false;
      }
      selector.is_match(relative)
    })
    .collect();

  info!(
    target = %target.display(),
    pattern = %selector.pattern(),
    members = selected.len(),
    "building archive"
  );

  let file = File::create(target).map_err(|source| PackagingError::CreateArchive {
    path: target.to_path_buf(),
    source,
  })?;
  let mut writer = ZipWriter::new(BufWriter::new(file));
  let options = entry_options();

  let mut members = Vec::with_capacity(selected.len() + 1);

  writer.start_file(MANIFEST_ENTRY, options)?;
  writer.write_all(&manifest_bytes).map_err(PackagingError::Write)?;
  members.push(MANIFEST_ENTRY.to_string());

  for (relative, path) in selected {
    let mut source = File::open(&path).map_err(|source| PackagingError::ReadMember {
      path: path.clone(),
      source,
    })?;
    writer.start_file(relative.as_str(), options)?;
    io::copy(&mut source, &mut writer).map_err(|source| PackagingError::ReadMember { path, source })?;
    debug!(member = %relative, "added");
    members.push(relative);
  }

  let mut inner = writer.finish()?;
  inner.flush().map_err(PackagingError::Write)?;
  drop(inner);

  let size = fs::metadata(target).map_err(PackagingError::Write)?.len();
  let sha256 = hash_file(target)?;

  info!(target = %target.display(), size, sha256 = %sha256, "archive written");

  Ok(ArchiveSummary {
    path: target.to_path_buf(),
    members,
    size,
    sha256,
  })
}
