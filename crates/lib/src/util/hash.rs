//! SHA-256 digests of finished archives.
//!
//! The digest is reported with every archive so two builds can be compared
//! without diffing bytes.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Lowercase hex SHA-256, 64 characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentHash(pub String);

impl std::fmt::Display for ContentHash {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(&self.0)
  }
}

#[derive(Debug, thiserror::Error)]
#[error("failed to hash {}: {source}", .path.display())]
pub struct HashError {
  pub path: PathBuf,
  #[source]
  pub source: io::Error,
}

/// Digest of a file, streamed so large archives are not held in memory.
pub fn hash_file(path: &Path) -> Result<ContentHash, HashError> {
  let wrap = |source| HashError {
    path: path.to_path_buf(),
    source,
  };

  let mut file = File::open(path).map_err(wrap)?;
  let mut hasher = Sha256::new();
  io::copy(&mut file, &mut hasher).map_err(wrap)?;

  Ok(ContentHash(hex::encode(hasher.finalize())))
}
