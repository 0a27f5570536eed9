//! Archive download with streaming verification.
//!
//! The archive is streamed once, in chunks, into three sinks: the cache file,
//! a SHA-256 hasher and a progress counter. Afterwards the server's `.sha256`
//! sidecar is fetched and compared with the computed digest. Only an exact
//! match yields an [`ArchiveFile`].
//!
//! There is no resume and no reuse: every call removes whatever is at the
//! cache path and downloads the archive again from scratch.

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::errors::{InstallError, Result};
use crate::http::Transport;
use crate::progress::{self, ProgressCallback, ProgressEvent, ProgressWriter};
use crate::stream::{CancellationToken, CopyError, FanoutWriter, copy_chunks};
use crate::target::{ArchiveFile, DownloadTarget};
use crate::verify::{check_digest, parse_published_digest};

/// Downloads release archives into a cache directory.
pub struct ArchiveFetcher<'a, T: Transport + ?Sized> {
    transport: &'a T,
    download_prefix: String,
    downloads: PathBuf,
    progress: Option<ProgressCallback>,
    cancel: CancellationToken,
}

impl<'a, T: Transport + ?Sized> ArchiveFetcher<'a, T> {
    /// Creates a fetcher for archives below `download_prefix`, stored in `downloads`.
    pub fn new(
        transport: &'a T,
        download_prefix: impl Into<String>,
        downloads: impl Into<PathBuf>,
    ) -> Self {
        Self {
            transport,
            download_prefix: download_prefix.into(),
            downloads: downloads.into(),
            progress: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Reports byte-count progress to `callback`.
    #[must_use]
    pub fn with_progress(mut self, callback: Option<ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Aborts the download between chunks once `token` is cancelled.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Local path `target` is downloaded to.
    #[must_use]
    pub fn archive_path(&self, target: &DownloadTarget) -> PathBuf {
        self.downloads.join(target.archive_name())
    }

    /// Downloads `target` and verifies it against the published digest.
    ///
    /// # Errors
    ///
    /// - [`InstallError::Network`] if either request fails in transit.
    /// - [`InstallError::HttpStatus`] if the archive or its digest answers
    ///   with a status above 299.
    /// - [`InstallError::MissingContentLength`] if the archive response has
    ///   no usable `Content-Length`.
    /// - [`InstallError::Filesystem`] if the cache file cannot be written.
    /// - [`InstallError::ChecksumMismatch`] if the digests differ. The
    ///   downloaded file is left in place.
    /// - [`InstallError::Cancelled`] if the token fires mid-download.
    pub fn download(&self, target: &DownloadTarget) -> Result<ArchiveFile> {
        let url = target.archive_url(&self.download_prefix);
        let name = target.archive_name();
        debug!(%url, "Downloading {name}");

        let mut response = self.transport.get(&url)?;
        if !response.is_success() {
            return Err(InstallError::HttpStatus {
                url,
                code: response.status,
            });
        }
        let total = response
            .content_length
            .ok_or_else(|| InstallError::MissingContentLength { url: url.clone() })?;

        fs::create_dir_all(&self.downloads).map_err(|e| {
            InstallError::filesystem("Failed to create directory", &self.downloads, e)
        })?;
        let path = self.archive_path(target);
        remove_stale(&path)?;

        let mut file = File::create(&path)
            .map_err(|e| InstallError::filesystem("Failed to create file", &path, e))?;
        let mut hasher = Sha256::new();
        let mut counter = ProgressWriter::new(self.progress.clone(), Some(total));

        progress::emit(
            self.progress.as_ref(),
            ProgressEvent::Started {
                label: name.clone(),
                total: Some(total),
            },
        );

        let written = {
            let sinks: Vec<&mut dyn Write> = vec![&mut file, &mut hasher, &mut counter];
            let mut fanout = FanoutWriter::new(sinks);
            copy_chunks(&mut response.body, &mut fanout, &self.cancel).map_err(|e| match e {
                CopyError::Read(e) => InstallError::network(&url, e),
                CopyError::Write(e) => {
                    InstallError::filesystem("Failed to write archive", &path, e)
                }
                CopyError::Cancelled => InstallError::Cancelled,
            })?
        };
        drop(file);

        progress::emit(self.progress.as_ref(), ProgressEvent::Finished { label: name });
        if written != total {
            debug!(written, total, "Body length differs from Content-Length");
        }

        let actual = hex::encode(hasher.finalize());
        let expected = self.published_digest(target)?;

        if let Err(err) = check_digest(&path, &expected, &actual) {
            warn!(
                path = %path.display(),
                %expected,
                %actual,
                "Checksum mismatch; archive left in place and will not be extracted"
            );
            return Err(err);
        }

        info!(path = %path.display(), sha256 = %actual, "Archive verified");
        Ok(ArchiveFile {
            path,
            sha256: actual,
            size: written,
            format: target.format(),
        })
    }

    fn published_digest(&self, target: &DownloadTarget) -> Result<String> {
        let url = target.checksum_url(&self.download_prefix);
        debug!(%url, "Fetching published digest");

        let mut response = self.transport.get(&url)?;
        if !response.is_success() {
            return Err(InstallError::HttpStatus {
                url,
                code: response.status,
            });
        }

        let mut body = String::new();
        response
            .body
            .read_to_string(&mut body)
            .map_err(|e| InstallError::network(&url, e))?;

        Ok(parse_published_digest(&body).to_string())
    }
}

fn remove_stale(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => {
            debug!(path = %path.display(), "Removed previous download");
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(InstallError::filesystem(
            "Failed to remove previous download",
            path,
            e,
        )),
    }
}
