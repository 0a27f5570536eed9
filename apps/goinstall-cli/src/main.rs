#![warn(clippy::pedantic)]

//! # goinstall
//!
//! Installs Go toolchain releases straight from the upstream distribution
//! server, verifying every archive against its published SHA-256 digest.
//!
//! ## Subcommands
//!
//! - `versions` - List available releases, newest first
//! - `install` - Download, verify and unpack a release
//!
//! ## Examples
//!
//! Install the newest stable release into `~/sdk/go`:
//! ```bash
//! goinstall install latest --dest ~/sdk/go
//! ```
//!
//! List stable releases as JSON:
//! ```bash
//! goinstall versions --stable --json
//! ```

mod commands;
mod logging;
mod render;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use commands::{install, versions};
use goinstall::InstallError;

/// Exit code used when the user interrupts a running operation.
const EXIT_CANCELLED: i32 = 130;

/// Go toolchain installer.
#[derive(Parser)]
#[command(
    name = "goinstall",
    author,
    version,
    about = "Download, verify and install Go toolchain releases",
    after_help = "\
ENVIRONMENT VARIABLES:
    GOINSTALL_HOME              Cache directory (default: ~/.goinstall)
    GOINSTALL_DOWNLOAD_PREFIX   Archive server (default: https://dl.google.com/go)
    GOINSTALL_SOURCE_URL        Reference listing URL
    GOINSTALL_PROXY             HTTPS proxy for all requests
    GOINSTALL_LOG               Log filter, e.g. goinstall=debug"
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every subcommand.
#[derive(Args)]
pub struct GlobalArgs {
    /// Log debug details to stderr.
    #[clap(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Cache directory holding the version listing and downloads.
    #[clap(long, global = true, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// HTTPS proxy URL used for every request.
    #[clap(long, global = true, value_name = "URL")]
    pub proxy: Option<String>,
}

/// Available subcommands.
#[derive(Subcommand)]
pub enum Commands {
    /// List available Go releases.
    ///
    /// Reads the cached reference listing, refreshing it from upstream when
    /// it is older than 72 hours, and prints release tags newest first.
    Versions(versions::VersionsArgs),

    /// Install a Go release.
    ///
    /// Downloads the archive for the requested version and platform, checks
    /// it against the published SHA-256 digest and unpacks it into the
    /// destination, replacing anything already there.
    Install(install::InstallArgs),
}

fn main() {
    if let Err(e) = run() {
        let exit_code = handle_error(&e);
        std::process::exit(exit_code);
    }
}

/// Prints an error and returns the exit code for it.
///
/// Cancellation gets the conventional SIGINT code and a one-line message;
/// everything else prints the full error chain and exits with 1.
fn handle_error(e: &anyhow::Error) -> i32 {
    if let Some(InstallError::Cancelled) = e.downcast_ref::<InstallError>() {
        eprintln!("Cancelled.");
        return EXIT_CANCELLED;
    }
    eprintln!("Error: {e:?}");
    1
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.global.verbose);

    match &cli.command {
        Commands::Versions(args) => versions::execute(&cli.global, args),
        Commands::Install(args) => install::execute(&cli.global, args),
    }
}
