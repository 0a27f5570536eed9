//! What to download, and what was downloaded.

use std::fmt;
use std::path::PathBuf;

use crate::catalog::VersionTag;
use crate::platform::{ArchiveFormat, Platform};

/// A release archive for one version and platform.
///
/// The archive name is `go{version}.{os}-{arch}.{ext}`, for example
/// `go1.21.0.linux-amd64.tar.gz`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTarget {
    /// Release being installed.
    pub version: VersionTag,
    /// Platform the archive is built for.
    pub platform: Platform,
}

impl DownloadTarget {
    #[must_use]
    pub fn new(version: VersionTag, platform: Platform) -> Self {
        Self { version, platform }
    }

    /// File name of the archive on the distribution server.
    #[must_use]
    pub fn archive_name(&self) -> String {
        format!(
            "go{}.{}.{}",
            self.version,
            self.platform,
            self.format().extension()
        )
    }

    /// Container format of the archive, decided by the target OS.
    #[must_use]
    pub fn format(&self) -> ArchiveFormat {
        self.platform.archive_format()
    }

    /// URL of the archive below `prefix`.
    #[must_use]
    pub fn archive_url(&self, prefix: &str) -> String {
        format!("{}/{}", prefix.trim_end_matches('/'), self.archive_name())
    }

    /// URL of the sidecar digest below `prefix`.
    #[must_use]
    pub fn checksum_url(&self, prefix: &str) -> String {
        format!("{}.sha256", self.archive_url(prefix))
    }
}

impl fmt::Display for DownloadTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "go{} ({})", self.version, self.platform)
    }
}

/// A downloaded archive whose digest matched the published one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveFile {
    /// Location in the download cache.
    pub path: PathBuf,
    /// Lowercase hex SHA-256 of the file contents.
    pub sha256: String,
    /// Size in bytes.
    pub size: u64,
    /// Container format, for extraction.
    pub format: ArchiveFormat,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{Arch, Os};

    fn target(version: &str, os: Os, arch: Arch) -> DownloadTarget {
        DownloadTarget::new(VersionTag::from(version), Platform::new(os, arch))
    }

    #[test]
    fn archive_name_encodes_version_and_platform() {
        assert_eq!(
            target("1.21.0", Os::Linux, Arch::Amd64).archive_name(),
            "go1.21.0.linux-amd64.tar.gz"
        );
        assert_eq!(
            target("1.22rc1", Os::Darwin, Arch::Arm64).archive_name(),
            "go1.22rc1.darwin-arm64.tar.gz"
        );
        assert_eq!(
            target("1.21.0", Os::Windows, Arch::Amd64).archive_name(),
            "go1.21.0.windows-amd64.zip"
        );
    }

    #[test]
    fn urls_are_built_from_prefix() {
        let t = target("1.21.0", Os::Linux, Arch::Arm64);
        assert_eq!(
            t.archive_url("https://dl.google.com/go/"),
            "https://dl.google.com/go/go1.21.0.linux-arm64.tar.gz"
        );
        assert_eq!(
            t.checksum_url("https://dl.google.com/go"),
            "https://dl.google.com/go/go1.21.0.linux-arm64.tar.gz.sha256"
        );
    }

    #[test]
    fn format_follows_target_not_host() {
        assert_eq!(
            target("1.21.0", Os::Windows, Arch::I386).format(),
            ArchiveFormat::Zip
        );
        assert_eq!(
            target("1.21.0", Os::FreeBsd, Arch::Amd64).format(),
            ArchiveFormat::TarGzip
        );
    }
}
