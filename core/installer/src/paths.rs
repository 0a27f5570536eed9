//! On-disk cache layout.
//!
//! ```text
//! ~/.goinstall/             # Root directory (or GOINSTALL_HOME)
//!   VERSION                 # Raw reference listing, refreshed every 72 hours
//!   downloads/              # Downloaded archives, one per target name
//! ```

use std::path::PathBuf;

use crate::errors::{InstallError, Result};

/// Environment variable to override the default cache root.
pub const GOINSTALL_HOME_ENV: &str = "GOINSTALL_HOME";

/// File name of the cached reference listing.
pub const VERSION_FILE: &str = "VERSION";

/// Subdirectory holding downloaded archives.
pub const DOWNLOADS_DIR: &str = "downloads";

/// Resolved locations inside a cache root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachePaths {
    /// The cache root.
    pub root: PathBuf,
    /// Directory holding downloaded archives.
    pub downloads: PathBuf,
    /// The cached reference listing.
    pub version_file: PathBuf,
}

impl CachePaths {
    /// Creates the layout below an explicit root.
    #[must_use]
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            downloads: root.join(DOWNLOADS_DIR),
            version_file: root.join(VERSION_FILE),
            root,
        }
    }
}

/// Returns the platform default cache root.
///
/// `~/.goinstall` on Unix-like systems, `%APPDATA%\goinstall` on Windows.
///
/// # Errors
///
/// Returns a configuration error if the home (or `AppData`) directory cannot
/// be determined.
pub fn default_root() -> Result<PathBuf> {
    #[cfg(windows)]
    {
        dirs::data_dir().map(|d| d.join("goinstall")).ok_or_else(|| {
            InstallError::config(format!(
                "Cannot determine AppData directory. Set {GOINSTALL_HOME_ENV} environment variable."
            ))
        })
    }
    #[cfg(not(windows))]
    {
        dirs::home_dir().map(|d| d.join(".goinstall")).ok_or_else(|| {
            InstallError::config(format!(
                "Cannot determine home directory. Set {GOINSTALL_HOME_ENV} environment variable."
            ))
        })
    }
}
