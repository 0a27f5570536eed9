//! Error types for the installation pipeline.
//!
//! Every stage (catalog, fetch, extract) fails fast with an [`InstallError`]
//! that names the failing stage and carries enough context (URL, path,
//! expected and actual digests, the underlying I/O error) to diagnose the
//! problem without retrying.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, InstallError>;

/// Boxed transport-level error.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Broad category of an [`InstallError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Remote endpoint could not be reached.
    Network,
    /// Remote endpoint answered with an error status.
    HttpStatus,
    /// Version cache could not be read.
    CacheRead,
    /// Version cache could not be written.
    CacheWrite,
    /// Downloaded bytes do not match the published digest.
    ChecksumMismatch,
    /// Archive is malformed or contains unexpected entries.
    ArchiveFormat,
    /// Destination entries could not be created or written.
    Filesystem,
    /// The caller cancelled the operation.
    Cancelled,
    /// Invalid configuration or unsupported target.
    Config,
}

/// Consolidated error type for the installer.
#[derive(Debug, Error)]
pub enum InstallError {
    /// Transport-level failure reaching a remote endpoint.
    #[error("network error: {url}")]
    Network {
        /// The URL being requested.
        url: String,
        /// The underlying transport or read error.
        #[source]
        source: BoxError,
    },

    /// The endpoint was reachable but returned an error status.
    #[error("HTTP {code}: {url}")]
    HttpStatus {
        /// The URL being requested.
        url: String,
        /// The HTTP status code.
        code: u16,
    },

    /// The archive response did not carry a numeric content length.
    #[error("missing or invalid Content-Length: {url}")]
    MissingContentLength {
        /// The URL being requested.
        url: String,
    },

    /// The cached reference listing could not be read.
    #[error("failed to read version cache: {}", path.display())]
    CacheRead {
        /// Path of the cache file.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The reference listing could not be persisted to the cache.
    #[error("failed to write version cache: {}", path.display())]
    CacheWrite {
        /// Path of the cache file.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The computed digest differs from the server-published digest.
    #[error("checksum mismatch for {}: expected {expected}, got {actual}", path.display())]
    ChecksumMismatch {
        /// The archive left on disk.
        path: PathBuf,
        /// Digest published by the server.
        expected: String,
        /// Digest computed over the downloaded bytes.
        actual: String,
    },

    /// The archive could not be decoded.
    #[error("malformed archive {}: {message}", path.display())]
    ArchiveFormat {
        /// The archive being read.
        path: PathBuf,
        /// What went wrong.
        message: String,
        /// The underlying decoder error.
        #[source]
        source: Option<BoxError>,
    },

    /// An archive entry would escape the destination directory.
    #[error("refusing to extract entry with absolute or parent reference: {}", path.display())]
    UnsafeEntryPath {
        /// The offending entry name.
        path: PathBuf,
    },

    /// A destination entry could not be created or written.
    #[error("{message}: {}", path.display())]
    Filesystem {
        /// Description of the failed operation.
        message: String,
        /// The path involved.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The operation was aborted through a cancellation token.
    #[error("operation cancelled")]
    Cancelled,

    /// The host or requested platform is not one Go publishes archives for.
    #[error("unsupported platform: {os} on {arch}")]
    UnsupportedPlatform {
        /// Operating system name.
        os: String,
        /// Architecture name.
        arch: String,
    },

    /// Invalid configuration.
    #[error("configuration error: {message}")]
    Config {
        /// Description of the problem.
        message: String,
        /// The underlying error, if any.
        #[source]
        source: Option<BoxError>,
    },
}

impl InstallError {
    /// Returns the category of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Network { .. } => ErrorKind::Network,
            Self::HttpStatus { .. } | Self::MissingContentLength { .. } => ErrorKind::HttpStatus,
            Self::CacheRead { .. } => ErrorKind::CacheRead,
            Self::CacheWrite { .. } => ErrorKind::CacheWrite,
            Self::ChecksumMismatch { .. } => ErrorKind::ChecksumMismatch,
            Self::ArchiveFormat { .. } | Self::UnsafeEntryPath { .. } => ErrorKind::ArchiveFormat,
            Self::Filesystem { .. } => ErrorKind::Filesystem,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::UnsupportedPlatform { .. } | Self::Config { .. } => ErrorKind::Config,
        }
    }

    /// Returns `true` if the error came from talking to a remote endpoint.
    #[must_use]
    pub fn is_remote(&self) -> bool {
        matches!(self.kind(), ErrorKind::Network | ErrorKind::HttpStatus)
    }

    /// Creates a new `Network` error.
    #[must_use]
    pub fn network(url: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Network {
            url: url.into(),
            source: source.into(),
        }
    }

    /// Creates a new `Filesystem` error.
    #[must_use]
    pub fn filesystem(
        message: impl Into<String>,
        path: impl Into<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        Self::Filesystem {
            message: message.into(),
            path: path.into(),
            source,
        }
    }

    /// Creates a new `ArchiveFormat` error.
    #[must_use]
    pub fn archive_format(
        path: impl Into<PathBuf>,
        message: impl Into<String>,
        source: Option<BoxError>,
    ) -> Self {
        Self::ArchiveFormat {
            path: path.into(),
            message: message.into(),
            source,
        }
    }

    /// Creates a new `Config` error.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            source: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checksum_mismatch_displays_both_values() {
        let err = InstallError::ChecksumMismatch {
            path: PathBuf::from("/cache/downloads/go1.21.0.linux-amd64.tar.gz"),
            expected: "abc123".to_string(),
            actual: "def456".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "checksum mismatch for /cache/downloads/go1.21.0.linux-amd64.tar.gz: \
             expected abc123, got def456"
        );
        assert_eq!(err.kind(), ErrorKind::ChecksumMismatch);
    }

    #[test]
    fn http_status_displays_code_and_url() {
        let err = InstallError::HttpStatus {
            url: "https://dl.google.com/go/go1.0.linux-amd64.tar.gz".to_string(),
            code: 404,
        };
        assert_eq!(
            err.to_string(),
            "HTTP 404: https://dl.google.com/go/go1.0.linux-amd64.tar.gz"
        );
    }

    #[test]
    fn remote_errors_are_grouped() {
        assert!(InstallError::network("https://example.com", "connection refused").is_remote());
        assert!(
            InstallError::HttpStatus {
                url: "https://example.com".to_string(),
                code: 500,
            }
            .is_remote()
        );
        assert!(!InstallError::Cancelled.is_remote());
        assert!(!InstallError::config("bad proxy").is_remote());
    }

    #[test]
    fn unsafe_entry_is_an_archive_format_error() {
        let err = InstallError::UnsafeEntryPath {
            path: PathBuf::from("../etc/passwd"),
        };
        assert_eq!(err.kind(), ErrorKind::ArchiveFormat);
    }

    #[test]
    fn filesystem_error_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = InstallError::filesystem("Failed to create file", "/dest/bin/go", io);
        assert_eq!(err.to_string(), "Failed to create file: /dest/bin/go");
        assert!(std::error::Error::source(&err).is_some());
    }
}
