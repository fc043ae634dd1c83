//! Static resource merging.
//!
//! Resources are copied over the compiler output in the staging directory.
//! A resource whose relative path collides with a compiled artifact replaces
//! it; the collision is logged and reported, never rejected.

use std::path::Path;

use serde::Serialize;
use tracing::{info, warn};

use crate::fs::{FilesystemError, copy_tree};

/// Outcome of a resource merge.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MergeReport {
  /// Relative paths of every copied file, in copy order.
  pub copied: Vec<String>,
  /// Relative paths that replaced a file already in the staging directory.
  pub overwritten: Vec<String>,
}

/// Copy every file under `src` into `dst`, preserving relative paths.
pub fn merge_resources(src: &Path, dst: &Path) -> Result<MergeReport, FilesystemError> {
  let mut report = MergeReport::default();

  for file in copy_tree(src, dst)? {
    if file.replaced {
      warn!(file = %file.relative, "resource overwrote an existing staging file");
      report.overwritten.push(file.relative.clone());
    }
    report.copied.push(file.relative);
  }

  info!(
    copied = report.copied.len(),
    overwritten = report.overwritten.len(),
    "merged resources"
  );
  Ok(report)
}
