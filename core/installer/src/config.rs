//! Installer configuration.
//!
//! Configuration is built once, up front, and handed to every stage that
//! talks to the network. Nothing here touches process-wide state: in
//! particular the proxy is applied through the HTTP client builder rather
//! than by exporting `HTTPS_PROXY`.
//!
//! Defaults can be overridden through environment variables:
//!
//! | Variable                    | Overrides                  |
//! |-----------------------------|----------------------------|
//! | `GOINSTALL_HOME`            | cache root                 |
//! | `GOINSTALL_DOWNLOAD_PREFIX` | archive download prefix    |
//! | `GOINSTALL_SOURCE_URL`      | reference listing URL      |
//! | `GOINSTALL_PROXY`           | HTTPS proxy                |

use std::path::PathBuf;
use std::time::Duration;

use crate::errors::Result;
use crate::paths::{self, CachePaths, GOINSTALL_HOME_ENV};

/// Default location archives and their `.sha256` sidecars are fetched from.
pub const DEFAULT_DOWNLOAD_PREFIX: &str = "https://dl.google.com/go";

/// Default location of the plaintext reference listing.
pub const DEFAULT_SOURCE_URL: &str = "https://go.googlesource.com/go/+refs?format=TEXT";

/// Environment variable overriding the download prefix.
pub const DOWNLOAD_PREFIX_ENV: &str = "GOINSTALL_DOWNLOAD_PREFIX";

/// Environment variable overriding the reference listing URL.
pub const SOURCE_URL_ENV: &str = "GOINSTALL_SOURCE_URL";

/// Environment variable holding an HTTPS proxy URL.
pub const PROXY_ENV: &str = "GOINSTALL_PROXY";

/// Default per-request timeout. Archives are well over 100 MB, so this is generous.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(600);

/// User agent sent with every request.
pub const USER_AGENT: &str = concat!("goinstall/", env!("CARGO_PKG_VERSION"));

/// Settings for the HTTP client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpConfig {
    /// HTTPS proxy URL, if any.
    pub proxy: Option<String>,
    /// Timeout applied to each request.
    pub timeout: Duration,
    /// Value of the `User-Agent` header.
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            proxy: None,
            timeout: DEFAULT_TIMEOUT,
            user_agent: USER_AGENT.to_string(),
        }
    }
}

/// Complete configuration for an installer run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallerConfig {
    /// Prefix archive names are appended to.
    pub download_prefix: String,
    /// URL of the reference listing.
    pub source_url: String,
    /// Cache root holding `VERSION` and `downloads/`.
    pub cache_root: PathBuf,
    /// HTTP client settings.
    pub http: HttpConfig,
}

impl InstallerConfig {
    /// Creates a configuration with default endpoints and the given cache root.
    #[must_use]
    pub fn with_cache_root(cache_root: impl Into<PathBuf>) -> Self {
        Self {
            download_prefix: DEFAULT_DOWNLOAD_PREFIX.to_string(),
            source_url: DEFAULT_SOURCE_URL.to_string(),
            cache_root: cache_root.into(),
            http: HttpConfig::default(),
        }
    }

    /// Builds a configuration from defaults and process environment overrides.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if no cache root is set and the home
    /// directory cannot be determined.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a configuration using `lookup` in place of the process environment.
    ///
    /// Empty or whitespace-only values count as unset. Trailing slashes are
    /// trimmed from URLs.
    ///
    /// # Errors
    ///
    /// Same as [`InstallerConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let cache_root = match get(GOINSTALL_HOME_ENV) {
            Some(home) => PathBuf::from(home),
            None => paths::default_root()?,
        };

        let mut config = Self::with_cache_root(cache_root);
        if let Some(prefix) = get(DOWNLOAD_PREFIX_ENV) {
            config.download_prefix = prefix.trim_end_matches('/').to_string();
        }
        if let Some(source) = get(SOURCE_URL_ENV) {
            config.source_url = source.trim_end_matches('/').to_string();
        }
        config.http.proxy = get(PROXY_ENV);

        Ok(config)
    }

    /// Returns the cache layout below `cache_root`.
    #[must_use]
    pub fn cache_paths(&self) -> CachePaths {
        CachePaths::with_root(&self.cache_root)
    }
}
