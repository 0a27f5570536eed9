#![warn(clippy::pedantic)]

//! Go toolchain installer.
//!
//! Resolves a release from the upstream reference listing, downloads its
//! archive while hashing it, checks the hash against the published `.sha256`
//! sidecar and unpacks the archive into a destination directory. Either the
//! installed tree is bit-exact to what the server published, or the call
//! fails with an [`InstallError`] naming the stage that went wrong.
//!
//! ## Module Structure
//!
//! - [`catalog`] - Reference listing cache, tag normalization and ordering
//! - [`fetch`] - Streaming download with digest verification
//! - [`archive`] - tar.gz and zip extraction with root stripping
//! - [`pipeline`] - Orchestration of the stages above
//! - [`http`] - Blocking HTTP transport
//! - [`config`] / [`paths`] - Endpoints, proxy and cache layout
//! - [`platform`] / [`target`] - Target platform and archive naming
//! - [`stream`] / [`progress`] - Fan-out copying, cancellation and progress events
//! - [`verify`] - SHA-256 helpers
//!
//! ## Example
//!
//! ```no_run
//! use goinstall::{DownloadTarget, InstallPipeline, InstallerConfig, Platform};
//!
//! # fn main() -> goinstall::Result<()> {
//! let pipeline = InstallPipeline::from_config(InstallerConfig::from_env()?)?;
//! let version = pipeline.resolve("latest")?;
//! let target = DownloadTarget::new(version, Platform::detect()?);
//! let report = pipeline.install(&target, std::path::Path::new("/usr/local/go"))?;
//! println!("installed {} into {}", report.target, report.destination.display());
//! # Ok(())
//! # }
//! ```

pub mod archive;
pub mod catalog;
pub mod config;
pub mod errors;
pub mod fetch;
pub mod http;
pub mod paths;
pub mod pipeline;
pub mod platform;
pub mod progress;
pub mod stream;
pub mod target;
pub mod verify;

#[cfg(test)]
mod test_support;

pub use archive::ArchiveExtractor;
pub use catalog::{VersionCatalog, VersionTag};
pub use config::{HttpConfig, InstallerConfig};
pub use errors::{ErrorKind, InstallError, Result};
pub use fetch::ArchiveFetcher;
pub use http::{HttpResponse, ReqwestTransport, Transport};
pub use paths::CachePaths;
pub use pipeline::{InstallPipeline, InstallReport};
pub use platform::{Arch, ArchiveFormat, Os, Platform};
pub use progress::{ProgressCallback, ProgressEvent};
pub use stream::CancellationToken;
pub use target::{ArchiveFile, DownloadTarget};
