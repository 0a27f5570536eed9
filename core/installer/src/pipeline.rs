//! End-to-end installation.
//!
//! [`InstallPipeline`] owns the configuration and the HTTP transport and
//! runs the stages strictly in order: download, verify, extract. The first
//! failure is returned as-is. Nothing is retried.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::archive::ArchiveExtractor;
use crate::catalog::{VersionCatalog, VersionTag};
use crate::config::InstallerConfig;
use crate::errors::{InstallError, Result};
use crate::fetch::ArchiveFetcher;
use crate::http::{ReqwestTransport, Transport};
use crate::progress::ProgressCallback;
use crate::stream::CancellationToken;
use crate::target::{ArchiveFile, DownloadTarget};

/// Version request meaning "newest stable release".
pub const LATEST: &str = "latest";

/// Outcome of a successful install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallReport {
    /// What was installed.
    pub target: DownloadTarget,
    /// The verified archive in the download cache.
    pub archive: ArchiveFile,
    /// Directory the archive was extracted into.
    pub destination: PathBuf,
}

/// Resolves, downloads, verifies and extracts releases.
pub struct InstallPipeline<T: Transport = ReqwestTransport> {
    config: InstallerConfig,
    transport: T,
    progress: Option<ProgressCallback>,
    cancel: CancellationToken,
}

impl InstallPipeline<ReqwestTransport> {
    /// Creates a pipeline talking HTTP according to `config.http`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the HTTP client cannot be built.
    pub fn from_config(config: InstallerConfig) -> Result<Self> {
        let transport = ReqwestTransport::new(&config.http)?;
        Ok(Self::with_transport(config, transport))
    }
}

impl<T: Transport> InstallPipeline<T> {
    /// Creates a pipeline over an explicit transport.
    pub fn with_transport(config: InstallerConfig, transport: T) -> Self {
        Self {
            config,
            transport,
            progress: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Reports download and extraction progress to `callback`.
    #[must_use]
    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    /// Aborts a running install once `token` is cancelled.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    #[must_use]
    pub fn config(&self) -> &InstallerConfig {
        &self.config
    }

    /// Catalog backed by `<cache_root>/VERSION`.
    #[must_use]
    pub fn catalog(&self) -> VersionCatalog<'_, T> {
        VersionCatalog::new(
            &self.transport,
            self.config.source_url.clone(),
            self.config.cache_paths().version_file,
        )
    }

    /// Lists every release, newest first.
    ///
    /// # Errors
    ///
    /// See [`VersionCatalog::list_versions`].
    pub fn list_versions(&self) -> Result<Vec<VersionTag>> {
        self.catalog().list_versions()
    }

    /// Turns a user request into a tag.
    ///
    /// `latest` resolves to the newest stable release; anything else is taken
    /// as a tag, with an optional leading `go` removed (`go1.21.0` → `1.21.0`).
    ///
    /// # Errors
    ///
    /// Returns catalog errors when resolving `latest`, or a configuration
    /// error if the request is empty or no stable release exists.
    pub fn resolve(&self, requested: &str) -> Result<VersionTag> {
        let requested = requested.trim();
        if requested.eq_ignore_ascii_case(LATEST) {
            return self
                .catalog()
                .latest_stable()?
                .ok_or_else(|| InstallError::config("no stable release found"));
        }

        let tag = requested.strip_prefix("go").unwrap_or(requested);
        if tag.is_empty() {
            return Err(InstallError::config("version must not be empty"));
        }
        Ok(VersionTag::new(tag))
    }

    /// Downloads, verifies and extracts `target` into `dest`.
    ///
    /// `dest` is only touched once the archive has been verified. From then
    /// on it is removed and repopulated; a failed extraction leaves it partial.
    ///
    /// # Errors
    ///
    /// - [`InstallError::Config`] if `dest` is the cache root or one of its
    ///   ancestors. Nothing is downloaded or removed in that case.
    /// - Any error from [`ArchiveFetcher::download`] or
    ///   [`ArchiveExtractor::extract`].
    pub fn install(&self, target: &DownloadTarget, dest: &Path) -> Result<InstallReport> {
        info!(%target, dest = %dest.display(), "Installing");
        let cache_root = &self.config.cache_root;
        if encloses(dest, cache_root) {
            return Err(InstallError::config(format!(
                "destination {} would remove the cache at {}",
                dest.display(),
                cache_root.display()
            )));
        }

        let fetcher = ArchiveFetcher::new(
            &self.transport,
            self.config.download_prefix.clone(),
            self.config.cache_paths().downloads,
        )
        .with_progress(self.progress.clone())
        .with_cancellation(self.cancel.clone());
        let archive = fetcher.download(target)?;

        ArchiveExtractor::new()
            .with_progress(self.progress.clone())
            .with_cancellation(self.cancel.clone())
            .extract(&archive.path, dest, archive.format)?;

        info!(%target, dest = %dest.display(), "Installed");
        Ok(InstallReport {
            target: target.clone(),
            archive,
            destination: dest.to_path_buf(),
        })
    }
}

/// Returns `true` if `inner` is `outer` or lies below it.
///
/// The deepest existing ancestor of each path is resolved through symlinks;
/// the part that does not exist yet is appended unchanged.
fn encloses(outer: &Path, inner: &Path) -> bool {
    resolve(inner).starts_with(resolve(outer))
}

fn resolve(path: &Path) -> PathBuf {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    for existing in absolute.ancestors() {
        if let Ok(real) = fs::canonicalize(existing) {
            return match absolute.strip_prefix(existing) {
                Ok(rest) if !rest.as_os_str().is_empty() => real.join(rest),
                _ => real,
            };
        }
    }
    absolute
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{Arch, Os, Platform};
    use crate::test_support::{Entry, MockTransport, read, sha256_hex, tar_gz, zip};
    use assert_fs::TempDir;

    const PREFIX: &str = "https://dl.example.com/go";
    const SOURCE: &str = "https://source.example.com/refs";

    fn config(temp: &TempDir) -> InstallerConfig {
        let mut config = InstallerConfig::with_cache_root(temp.path().join("cache"));
        config.download_prefix = PREFIX.to_string();
        config.source_url = SOURCE.to_string();
        config
    }

    fn release() -> Vec<u8> {
        tar_gz(&[
            Entry::Dir("go/", 0o755),
            Entry::File("go/bin/go", b"go binary", 0o755),
            Entry::File("go/VERSION", b"go1.21.0\n", 0o644),
        ])
    }

    fn serving(target: &DownloadTarget, archive: &[u8], digest: &str) -> MockTransport {
        MockTransport::new()
            .with(&target.archive_url(PREFIX), 200, archive.to_vec())
            .with(&target.checksum_url(PREFIX), 200, digest.to_string())
    }

    fn linux_target() -> DownloadTarget {
        DownloadTarget::new(
            VersionTag::from("1.21.0"),
            Platform::new(Os::Linux, Arch::Amd64),
        )
    }

    #[test]
    fn install_downloads_verifies_and_extracts() {
        let temp = TempDir::new().unwrap();
        let archive = release();
        let target = linux_target();
        let transport = serving(&target, &archive, &sha256_hex(&archive));
        let pipeline = InstallPipeline::with_transport(config(&temp), transport);
        let dest = temp.path().join("goroot");

        let report = pipeline.install(&target, &dest).unwrap();

        assert_eq!(report.destination, dest);
        assert_eq!(report.archive.sha256, sha256_hex(&archive));
        assert_eq!(
            report.archive.path,
            temp.path()
                .join("cache/downloads/go1.21.0.linux-amd64.tar.gz")
        );
        assert_eq!(read(&dest.join("bin/go")), "go binary");
        assert_eq!(read(&dest.join("VERSION")), "go1.21.0\n");
    }

    #[test]
    fn windows_targets_use_zip() {
        let temp = TempDir::new().unwrap();
        let archive = zip(&[Entry::File("go/bin/go.exe", b"exe", 0o755)]);
        let target = DownloadTarget::new(
            VersionTag::from("1.21.0"),
            Platform::new(Os::Windows, Arch::Amd64),
        );
        let transport = serving(&target, &archive, &sha256_hex(&archive));
        let pipeline = InstallPipeline::with_transport(config(&temp), transport);
        let dest = temp.path().join("goroot");

        pipeline.install(&target, &dest).unwrap();
        assert_eq!(read(&dest.join("bin/go.exe")), "exe");
    }

    #[test]
    fn checksum_mismatch_never_touches_destination() {
        let temp = TempDir::new().unwrap();
        let archive = release();
        let target = linux_target();
        let transport = serving(&target, &archive, &"0".repeat(64));
        let pipeline = InstallPipeline::with_transport(config(&temp), transport);

        let dest = temp.path().join("goroot");
        fs::create_dir_all(&dest).unwrap();
        fs::write(dest.join("previous"), "kept").unwrap();

        let err = pipeline.install(&target, &dest).unwrap_err();
        assert!(matches!(err, InstallError::ChecksumMismatch { .. }));
        assert_eq!(read(&dest.join("previous")), "kept");
    }

    #[test]
    fn destination_enclosing_the_cache_is_rejected() {
        let temp = TempDir::new().unwrap();
        let archive = release();
        let target = linux_target();
        let transport = serving(&target, &archive, &sha256_hex(&archive));
        let cache_root = temp.path().join("cache");
        fs::create_dir_all(&cache_root).unwrap();
        fs::write(cache_root.join("VERSION"), "a refs/tags/go1.21.0\n").unwrap();
        let pipeline = InstallPipeline::with_transport(config(&temp), transport);

        for dest in [cache_root.clone(), temp.path().to_path_buf()] {
            let err = pipeline.install(&target, &dest).unwrap_err();
            assert!(matches!(err, InstallError::Config { .. }), "{err:?}");
        }
        assert_eq!(read(&cache_root.join("VERSION")), "a refs/tags/go1.21.0\n");
        assert_eq!(pipeline.transport.request_count(&target.archive_url(PREFIX)), 0);
    }

    #[test]
    fn encloses_compares_paths_that_do_not_exist_yet() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("a");

        assert!(encloses(&root, &root.join("b/c")));
        assert!(encloses(&root, &root));
        assert!(!encloses(&root.join("b"), &root));
        assert!(!encloses(&temp.path().join("ab"), &root.join("c")));
    }

    #[test]
    fn destination_inside_the_cache_is_allowed() {
        let temp = TempDir::new().unwrap();
        let archive = release();
        let target = linux_target();
        let transport = serving(&target, &archive, &sha256_hex(&archive));
        let pipeline = InstallPipeline::with_transport(config(&temp), transport);
        let dest = temp.path().join("cache").join("go");

        pipeline.install(&target, &dest).unwrap();
        assert_eq!(read(&dest.join("bin/go")), "go binary");
        assert!(
            temp.path()
                .join("cache/downloads/go1.21.0.linux-amd64.tar.gz")
                .exists()
        );
    }

    #[test]
    fn reinstall_over_previous_install_is_identical() {
        let temp = TempDir::new().unwrap();
        let archive = release();
        let target = linux_target();
        let transport = serving(&target, &archive, &sha256_hex(&archive));
        let pipeline = InstallPipeline::with_transport(config(&temp), transport);
        let dest = temp.path().join("goroot");

        pipeline.install(&target, &dest).unwrap();
        fs::write(dest.join("bin/stray"), "left over").unwrap();
        pipeline.install(&target, &dest).unwrap();

        let mut names: Vec<_> = fs::read_dir(dest.join("bin"))
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        names.sort();
        assert_eq!(names, vec!["go"]);
        assert_eq!(read(&dest.join("VERSION")), "go1.21.0\n");
    }

    #[test]
    fn resolve_handles_latest_and_prefixes() {
        let temp = TempDir::new().unwrap();
        let listing = "a refs/tags/go1.22rc1\nb refs/tags/go1.21.3\n";
        let transport = MockTransport::new().with(SOURCE, 200, listing);
        let pipeline = InstallPipeline::with_transport(config(&temp), transport);

        assert_eq!(pipeline.resolve("latest").unwrap(), VersionTag::from("1.21.3"));
        assert_eq!(pipeline.resolve("go1.20.1").unwrap(), VersionTag::from("1.20.1"));
        assert_eq!(pipeline.resolve("1.22rc1").unwrap(), VersionTag::from("1.22rc1"));
        assert!(matches!(
            pipeline.resolve("go"),
            Err(InstallError::Config { .. })
        ));
    }

    #[test]
    fn list_versions_uses_cache_root() {
        let temp = TempDir::new().unwrap();
        let transport = MockTransport::new().with(SOURCE, 200, "a refs/tags/go1.21.0\n");
        let pipeline = InstallPipeline::with_transport(config(&temp), transport);

        assert_eq!(
            pipeline.list_versions().unwrap(),
            vec![VersionTag::from("1.21.0")]
        );
        assert!(temp.path().join("cache/VERSION").exists());
    }
}
