//! Target platform description.
//!
//! Go release archives are named after the Go spelling of the operating
//! system and architecture (`linux-amd64`, `darwin-arm64`, ...). The archive
//! format is a property of the target, not of the host running the
//! installer: Windows builds ship as `.zip`, everything else as `.tar.gz`.

use std::fmt;
use std::str::FromStr;

use crate::errors::InstallError;

/// Operating systems Go publishes binary archives for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Os {
    /// Linux
    Linux,
    /// macOS
    Darwin,
    /// Windows
    Windows,
    /// FreeBSD
    FreeBsd,
}

impl Os {
    /// Returns the Go name of this operating system.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Linux => "linux",
            Self::Darwin => "darwin",
            Self::Windows => "windows",
            Self::FreeBsd => "freebsd",
        }
    }
}

impl FromStr for Os {
    type Err = InstallError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "linux" => Ok(Self::Linux),
            "darwin" | "macos" => Ok(Self::Darwin),
            "windows" => Ok(Self::Windows),
            "freebsd" => Ok(Self::FreeBsd),
            other => Err(InstallError::UnsupportedPlatform {
                os: other.to_string(),
                arch: "any".to_string(),
            }),
        }
    }
}

impl fmt::Display for Os {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// CPU architectures Go publishes binary archives for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arch {
    /// `x86_64`
    Amd64,
    /// `aarch64`
    Arm64,
    /// 32-bit x86
    I386,
    /// 32-bit ARM
    Armv6l,
}

impl Arch {
    /// Returns the Go name of this architecture.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Amd64 => "amd64",
            Self::Arm64 => "arm64",
            Self::I386 => "386",
            Self::Armv6l => "armv6l",
        }
    }
}

impl FromStr for Arch {
    type Err = InstallError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "amd64" | "x86_64" => Ok(Self::Amd64),
            "arm64" | "aarch64" => Ok(Self::Arm64),
            "386" | "x86" => Ok(Self::I386),
            "armv6l" | "arm" => Ok(Self::Armv6l),
            other => Err(InstallError::UnsupportedPlatform {
                os: "any".to_string(),
                arch: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Archive container used for a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArchiveFormat {
    /// gzip-compressed tar stream
    TarGzip,
    /// zip container
    Zip,
}

impl ArchiveFormat {
    /// Returns the file extension, without a leading dot.
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::TarGzip => "tar.gz",
            Self::Zip => "zip",
        }
    }
}

/// An operating system and architecture pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Platform {
    /// Target operating system.
    pub os: Os,
    /// Target architecture.
    pub arch: Arch,
}

impl Platform {
    /// Creates a platform from its parts.
    #[must_use]
    pub fn new(os: Os, arch: Arch) -> Self {
        Self { os, arch }
    }

    /// Detects the platform the installer is running on.
    ///
    /// # Errors
    ///
    /// Returns [`InstallError::UnsupportedPlatform`] if the host OS or
    /// architecture has no Go binary distribution.
    pub fn detect() -> Result<Self, InstallError> {
        let unsupported = || InstallError::UnsupportedPlatform {
            os: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
        };
        let os = std::env::consts::OS.parse().map_err(|_| unsupported())?;
        let arch = std::env::consts::ARCH.parse().map_err(|_| unsupported())?;
        Ok(Self { os, arch })
    }

    /// Returns the archive format published for this platform.
    #[must_use]
    pub fn archive_format(self) -> ArchiveFormat {
        match self.os {
            Os::Windows => ArchiveFormat::Zip,
            Os::Linux | Os::Darwin | Os::FreeBsd => ArchiveFormat::TarGzip,
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.os, self.arch)
    }
}
