//! Install command for the goinstall CLI.
//!
//! Downloads a Go release archive, verifies it against the published SHA-256
//! digest and unpacks it into a destination directory. Whatever was in the
//! destination before is replaced.
//!
//! ## Usage
//!
//! ```bash
//! goinstall install                          # Latest stable into ~/.goinstall/go
//! goinstall install 1.21.5 --dest ~/sdk/go   # Specific version and location
//! goinstall install go1.22rc1 --os windows   # Cross-platform download
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use goinstall::archive::DEFAULT_ROOT;
use goinstall::pipeline::LATEST;
use goinstall::{Arch, CancellationToken, DownloadTarget, InstallPipeline, Os, Platform};
use tracing::debug;

use super::load_config;
use crate::GlobalArgs;
use crate::render::TerminalProgress;

/// Arguments for the install command.
#[derive(Args)]
pub struct InstallArgs {
    /// Version to install (e.g., "1.21.5", "go1.22rc1" or "latest").
    #[clap(default_value = LATEST)]
    pub version: String,

    /// Directory to install into; replaced entirely.
    ///
    /// Defaults to `go` inside the cache directory.
    #[clap(long, short = 'd', value_name = "DIR")]
    pub dest: Option<PathBuf>,

    /// Target operating system (linux, darwin, windows, freebsd).
    #[clap(long, value_name = "OS")]
    pub os: Option<String>,

    /// Target architecture (amd64, arm64, 386, armv6l).
    #[clap(long, value_name = "ARCH")]
    pub arch: Option<String>,
}

/// Executes the install command.
///
/// # Process
///
/// 1. Resolve the target platform from flags or the host
/// 2. Resolve the requested version (`latest` reads the reference listing)
/// 3. Download the archive with progress display
/// 4. Verify the SHA-256 digest
/// 5. Extract into the destination
///
/// Ctrl-C stops the download or extraction between chunks.
///
/// # Errors
///
/// Returns an error if the platform is unsupported, the version cannot be
/// resolved, or any pipeline stage fails.
pub fn execute(global: &GlobalArgs, args: &InstallArgs) -> Result<()> {
    let platform = target_platform(args)?;
    let config = load_config(global)?;
    let dest = args
        .dest
        .clone()
        .unwrap_or_else(|| config.cache_root.join(DEFAULT_ROOT));

    let cancel = CancellationToken::new();
    let handler_token = cancel.clone();
    ctrlc::set_handler(move || handler_token.cancel())
        .context("Failed to install Ctrl-C handler")?;

    let pipeline = InstallPipeline::from_config(config)?.with_cancellation(cancel);
    let version = pipeline.resolve(&args.version)?;
    let target = DownloadTarget::new(version, platform);
    debug!(%target, "Resolved install target");

    let progress = TerminalProgress::new(target.archive_name());
    let pipeline = pipeline.with_progress(progress.callback());

    println!("Installing Go {} for {platform}...", target.version);
    let report = pipeline.install(&target, &dest)?;
    progress.finish();

    println!(
        "Go {} installed to {}",
        report.target.version,
        report.destination.display()
    );
    println!("Add {} to your PATH to use it.", report.destination.join("bin").display());
    Ok(())
}

fn target_platform(args: &InstallArgs) -> Result<Platform> {
    if args.os.is_none() && args.arch.is_none() {
        return Ok(Platform::detect()?);
    }

    let host = Platform::detect().ok();
    let os = match &args.os {
        Some(os) => os.parse::<Os>()?,
        None => host.map(|p| p.os).context("--os is required on this host")?,
    };
    let arch = match &args.arch {
        Some(arch) => arch.parse::<Arch>()?,
        None => host.map(|p| p.arch).context("--arch is required on this host")?,
    };
    Ok(Platform::new(os, arch))
}
