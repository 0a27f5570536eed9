//! SHA-256 helpers.

use std::path::Path;

use crate::errors::{InstallError, Result};

/// Extracts the digest from a sidecar `.sha256` document.
///
/// The document is normally just the hex digest, possibly followed by a
/// newline. `sha256sum`-style `<digest>  <file>` bodies are accepted too; only
/// the first token is returned.
#[must_use]
pub fn parse_published_digest(body: &str) -> &str {
    body.split_whitespace().next().unwrap_or("")
}

/// Compares a computed digest with a published one.
///
/// The comparison is exact: the server publishes lowercase hex and so does
/// [`hex::encode`].
///
/// # Errors
///
/// Returns [`InstallError::ChecksumMismatch`] carrying both values.
pub fn check_digest(path: &Path, expected: &str, actual: &str) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(InstallError::ChecksumMismatch {
            path: path.to_path_buf(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        })
    }
}
