//! Archive extraction.
//!
//! Release archives keep everything under a single `go/` directory. The
//! extractor strips that root so `go/bin/go` lands at `<dest>/bin/go`. Entries
//! outside the root are written unchanged. The format is chosen by the caller
//! from the download target, never sniffed from the file.
//!
//! The destination is removed before anything is written, so the result
//! reflects only the archive contents. If extraction then fails the
//! destination is left half-populated; callers re-run the install.

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Component, Path, PathBuf};

use flate2::read::GzDecoder;
use tracing::{debug, info};

use crate::errors::{InstallError, Result};
use crate::platform::ArchiveFormat;
use crate::progress::{self, ProgressCallback, ProgressEvent, ProgressWriter};
use crate::stream::{CancellationToken, CopyError, FanoutWriter, copy_chunks};

/// Directory every entry of an upstream release archive is nested under.
pub const DEFAULT_ROOT: &str = "go";

/// Unpacks tar.gz and zip archives into a destination directory.
pub struct ArchiveExtractor {
    root: Option<String>,
    progress: Option<ProgressCallback>,
    cancel: CancellationToken,
}

impl Default for ArchiveExtractor {
    fn default() -> Self {
        Self {
            root: Some(DEFAULT_ROOT.to_string()),
            progress: None,
            cancel: CancellationToken::new(),
        }
    }
}

impl ArchiveExtractor {
    /// Creates an extractor that strips the [`DEFAULT_ROOT`] directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the leading directory to strip, or `None` to keep paths as-is.
    #[must_use]
    pub fn with_root(mut self, root: Option<String>) -> Self {
        self.root = root;
        self
    }

    /// Reports per-entry byte-count progress to `callback`.
    #[must_use]
    pub fn with_progress(mut self, callback: Option<ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Aborts extraction between chunks once `token` is cancelled.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Replaces `dest` with the contents of `archive`.
    ///
    /// Directory and file permission bits are taken from the archive on Unix.
    /// An empty archive leaves an empty `dest`.
    ///
    /// # Errors
    ///
    /// - [`InstallError::ArchiveFormat`] if the archive cannot be decoded.
    /// - [`InstallError::UnsafeEntryPath`] if an entry is absolute or
    ///   contains `..`. Nothing is written for that entry.
    /// - [`InstallError::Filesystem`] if `dest` cannot be reset or an entry
    ///   cannot be created or written.
    /// - [`InstallError::Cancelled`] if the token fires.
    pub fn extract(&self, archive: &Path, dest: &Path, format: ArchiveFormat) -> Result<()> {
        info!(
            archive = %archive.display(),
            dest = %dest.display(),
            ?format,
            "Extracting archive"
        );
        reset_destination(dest)?;

        let files = match format {
            ArchiveFormat::TarGzip => self.extract_tar_gz(archive, dest)?,
            ArchiveFormat::Zip => self.extract_zip(archive, dest)?,
        };

        info!(files, dest = %dest.display(), "Extraction complete");
        Ok(())
    }

    fn extract_tar_gz(&self, archive_path: &Path, dest: &Path) -> Result<usize> {
        let file = File::open(archive_path)
            .map_err(|e| InstallError::filesystem("Failed to open archive", archive_path, e))?;
        let mut archive = tar::Archive::new(GzDecoder::new(file));
        let malformed = |message: &str, e: std::io::Error| {
            InstallError::archive_format(archive_path, message, Some(Box::new(e)))
        };

        let mut files = 0;
        let entries = archive
            .entries()
            .map_err(|e| malformed("Failed to read tar entries", e))?;

        for entry in entries {
            self.check_cancelled()?;
            let mut entry = entry.map_err(|e| malformed("Failed to read tar entry", e))?;
            let name = entry
                .path()
                .map_err(|e| malformed("Invalid entry path", e))?
                .into_owned();

            let Some(relative) = self.relative_path(&name)? else {
                continue;
            };
            let output_path = dest.join(&relative);

            let header = entry.header();
            let entry_type = header.entry_type();
            let mode = header
                .mode()
                .map_err(|e| malformed("Invalid entry mode", e))?;

            if entry_type.is_dir() {
                create_dir(&output_path, Some(mode))?;
            } else if entry_type.is_file() {
                let size = entry.size();
                self.write_file(&mut entry, &output_path, Some(mode), size, &relative)?;
                files += 1;
            } else {
                debug!(entry = %name.display(), ?entry_type, "Skipping unsupported tar entry");
            }
        }

        Ok(files)
    }

    fn extract_zip(&self, archive_path: &Path, dest: &Path) -> Result<usize> {
        let file = File::open(archive_path)
            .map_err(|e| InstallError::filesystem("Failed to open archive", archive_path, e))?;
        let mut archive = zip::ZipArchive::new(file).map_err(|e| {
            InstallError::archive_format(archive_path, "Failed to read ZIP archive", Some(Box::new(e)))
        })?;

        let mut files = 0;
        for i in 0..archive.len() {
            self.check_cancelled()?;
            let mut entry = archive.by_index(i).map_err(|e| {
                InstallError::archive_format(
                    archive_path,
                    format!("Failed to read archive entry {i}"),
                    Some(Box::new(e)),
                )
            })?;

            let name = PathBuf::from(entry.name());
            let Some(relative) = self.relative_path(&name)? else {
                continue;
            };
            let output_path = dest.join(&relative);
            let mode = entry.unix_mode();

            if entry.is_dir() {
                create_dir(&output_path, mode)?;
            } else {
                let size = entry.size();
                self.write_file(&mut entry, &output_path, mode, size, &relative)?;
                files += 1;
            }
        }

        Ok(files)
    }

    /// Maps an entry name to its path below the destination.
    ///
    /// Returns `None` for the root directory itself and for entries that
    /// reduce to nothing (`./`).
    fn relative_path(&self, name: &Path) -> Result<Option<PathBuf>> {
        if name.is_absolute()
            || name.components().any(|c| {
                matches!(
                    c,
                    Component::ParentDir | Component::RootDir | Component::Prefix(_)
                )
            })
        {
            return Err(InstallError::UnsafeEntryPath {
                path: name.to_path_buf(),
            });
        }

        let stripped = match &self.root {
            Some(root) => name.strip_prefix(root).unwrap_or(name),
            None => name,
        };
        let relative: PathBuf = stripped
            .components()
            .filter(|c| !matches!(c, Component::CurDir))
            .collect();

        Ok((!relative.as_os_str().is_empty()).then_some(relative))
    }

    fn write_file(
        &self,
        reader: &mut dyn Read,
        output_path: &Path,
        mode: Option<u32>,
        size: u64,
        label: &Path,
    ) -> Result<()> {
        if let Some(parent) = output_path.parent() {
            create_dir(parent, None)?;
        }

        let mut file = open_truncated(output_path, mode)
            .map_err(|e| InstallError::filesystem("Failed to create file", output_path, e))?;
        let mut counter = ProgressWriter::new(self.progress.clone(), Some(size));
        let label = label.display().to_string();

        progress::emit(
            self.progress.as_ref(),
            ProgressEvent::Started {
                label: label.clone(),
                total: Some(size),
            },
        );
        {
            let sinks: Vec<&mut dyn Write> = vec![&mut file, &mut counter];
            let mut fanout = FanoutWriter::new(sinks);
            copy_chunks(reader, &mut fanout, &self.cancel).map_err(|e| match e {
                CopyError::Read(e) | CopyError::Write(e) => {
                    InstallError::filesystem("Failed to extract", output_path, e)
                }
                CopyError::Cancelled => InstallError::Cancelled,
            })?;
        }
        drop(file);

        if let Some(mode) = mode {
            apply_mode(output_path, mode)?;
        }
        progress::emit(self.progress.as_ref(), ProgressEvent::Finished { label });
        Ok(())
    }

    fn check_cancelled(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            Err(InstallError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Removes `dest` if present and recreates it empty.
fn reset_destination(dest: &Path) -> Result<()> {
    match fs::symlink_metadata(dest) {
        Ok(meta) => {
            debug!(dest = %dest.display(), "Removing existing destination");
            let removed = if meta.is_dir() {
                fs::remove_dir_all(dest)
            } else {
                fs::remove_file(dest)
            };
            removed.map_err(|e| {
                InstallError::filesystem("Failed to remove existing destination", dest, e)
            })?;
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => {
            return Err(InstallError::filesystem(
                "Failed to inspect destination",
                dest,
                e,
            ));
        }
    }

    fs::create_dir_all(dest)
        .map_err(|e| InstallError::filesystem("Failed to create directory", dest, e))
}

fn create_dir(path: &Path, mode: Option<u32>) -> Result<()> {
    fs::create_dir_all(path)
        .map_err(|e| InstallError::filesystem("Failed to create directory", path, e))?;
    if let Some(mode) = mode {
        apply_mode(path, mode)?;
    }
    Ok(())
}

#[cfg(unix)]
fn open_truncated(path: &Path, mode: Option<u32>) -> std::io::Result<File> {
    use std::os::unix::fs::OpenOptionsExt;

    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    if let Some(mode) = mode {
        options.mode(mode & 0o7777);
    }
    options.open(path)
}

#[cfg(not(unix))]
fn open_truncated(path: &Path, _mode: Option<u32>) -> std::io::Result<File> {
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
}

/// Sets permission bits explicitly, since the process umask applies on create.
#[cfg(unix)]
fn apply_mode(path: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(mode & 0o7777))
        .map_err(|e| InstallError::filesystem("Failed to set permissions", path, e))
}

#[cfg(not(unix))]
#[allow(clippy::unnecessary_wraps)]
fn apply_mode(_path: &Path, _mode: u32) -> Result<()> {
    Ok(())
}
