//! Content hashing for determinism checks.
//!
//! The engine stage records the SHA-256 of the amalgamated source pair so
//! two clean runs against pinned upstream revisions can be compared for
//! byte-identical output from their reports alone.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A full 64-character SHA-256 hash of a file's contents.
///
/// # Format
///
/// The hash is a lowercase hexadecimal string (64 characters).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash(pub String);

impl std::fmt::Display for ContentHash {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.0)
  }
}

/// Hash a single file's contents.
pub fn hash_file(path: &Path) -> Result<ContentHash, std::io::Error> {
  let mut file = File::open(path)?;
  let mut hasher = Sha256::new();
  let mut buffer = [0u8; 8192];

  loop {
    let read = file.read(&mut buffer)?;
    if read == 0 {
      break;
    }
    hasher.update(&buffer[..read]);
  }

  Ok(ContentHash(format!("{:x}", hasher.finalize())))
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::TempDir;

  #[test]
  fn hash_is_deterministic() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("sqlite3.c");
    std::fs::write(&path, "int main(void) { return 0; }\n").unwrap();

    let first = hash_file(&path).unwrap();
    let second = hash_file(&path).unwrap();

    assert_eq!(first, second);
    assert_eq!(first.0.len(), 64);
  }

  #[test]
  fn different_content_hashes_differently() {
    let temp = TempDir::new().unwrap();
    let a = temp.path().join("a");
    let b = temp.path().join("b");
    std::fs::write(&a, "one").unwrap();
    std::fs::write(&b, "two").unwrap();

    assert_ne!(hash_file(&a).unwrap(), hash_file(&b).unwrap());
  }

  #[test]
  fn known_vector() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("empty");
    std::fs::write(&path, "").unwrap();

    let hash = hash_file(&path).unwrap();

    assert_eq!(
      hash.0,
      "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
    );
  }

  #[test]
  fn missing_file_fails() {
    assert!(hash_file(Path::new("/nonexistent/file")).is_err());
  }
}
