use std::path::Path;

use docseal_types::Fingerprint;
use sha2::{Digest, Sha256};

/// SHA-256 document fingerprinter.
///
/// The fingerprint depends only on the document's bytes, never on its name
/// or metadata. No domain tag is mixed in: the digest must match what any
/// other SHA-256 implementation computes for the same file, because that is
/// what gets anchored and later re-derived by third parties.
pub struct DocumentHasher;

impl DocumentHasher {
    /// Fingerprint a complete document.
    ///
    /// Fails with [`HashError::InvalidInput`] on empty input: an empty source
    /// is treated as a failed read, not as a document.
    pub fn hash(data: &[u8]) -> Result<Fingerprint, HashError> {
        if data.is_empty() {
            return Err(HashError::InvalidInput);
        }
        Ok(Fingerprint::from_digest(Sha256::digest(data).into()))
    }

    /// Read a file fully into memory and fingerprint it.
    pub fn hash_file(path: &Path) -> Result<Fingerprint, HashError> {
        let data = std::fs::read(path).map_err(|e| HashError::Unreadable {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::hash(&data)
    }

    /// Check that data produces the expected fingerprint.
    pub fn verify(data: &[u8], expected: &Fingerprint) -> bool {
        matches!(Self::hash(data), Ok(actual) if actual == *expected)
    }
}

/// Errors from hashing operations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum HashError {
    #[error("invalid input: document is empty")]
    InvalidInput,

    #[error("cannot read {path}: {reason}")]
    Unreadable { path: String, reason: String },
}
