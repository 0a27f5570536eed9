//! Command modules for the goinstall CLI.
//!
//! - [`versions`] - List available releases
//! - [`install`] - Download, verify and unpack a release

pub mod install;
pub mod versions;

use anyhow::Result;
use goinstall::InstallerConfig;

use crate::GlobalArgs;

/// Builds the installer configuration from the environment, then applies
/// command-line overrides on top.
///
/// # Errors
///
/// Returns an error if no cache directory is given and the home directory
/// cannot be determined.
pub fn load_config(global: &GlobalArgs) -> Result<InstallerConfig> {
    let mut config = InstallerConfig::from_env()?;
    if let Some(dir) = &global.cache_dir {
        config.cache_root.clone_from(dir);
    }
    if let Some(proxy) = &global.proxy {
        config.http.proxy = Some(proxy.clone());
    }
    Ok(config)
}
