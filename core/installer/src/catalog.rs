//! Release discovery.
//!
//! The upstream repository publishes its refs as a plaintext listing, one
//! `<commit> <ref>` pair per line. Release tags look like `refs/tags/go1.21.0`
//! or `refs/tags/go1.22rc1`. [`VersionCatalog`] keeps a copy of the listing
//! in the cache (refreshed every 72 hours), extracts the tags and orders them
//! newest first.
//!
//! Upstream tags are not valid semantic versions (`1.21`, `1.22rc1`,
//! `1.9beta2`), so each tag is rewritten into a comparable form before
//! sorting. The rewritten form is only used for ordering; callers always get
//! the tag exactly as published.

use std::cmp::Ordering;
use std::fmt;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::errors::{InstallError, Result};
use crate::http::Transport;

/// Marker identifying release tags in the reference listing.
pub const TAG_PREFIX: &str = "refs/tags/go";

/// Age after which the cached listing is fetched again.
pub const CACHE_TTL: Duration = Duration::from_secs(72 * 60 * 60);

/// Pre-release markers used in upstream tags, in no particular order.
const PRERELEASE_MARKERS: [&str; 2] = ["beta", "rc"];

/// A release identifier exactly as published (`1.21.0`, `1.22rc1`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionTag(String);

impl VersionTag {
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the comparable form of this tag. See [`normalize`].
    #[must_use]
    pub fn normalized(&self) -> String {
        normalize(&self.0)
    }

    /// Returns `true` for beta and release-candidate tags, and for tags that
    /// do not normalize to a valid version.
    #[must_use]
    pub fn is_prerelease(&self) -> bool {
        semver::Version::parse(&self.normalized()).map_or(true, |v| !v.pre.is_empty())
    }
}

impl fmt::Display for VersionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for VersionTag {
    fn from(tag: &str) -> Self {
        Self::new(tag)
    }
}

/// Rewrites an upstream tag into a semantic version string.
///
/// Missing numeric sections are filled with `.0` and a trailing `beta` or
/// `rc` marker becomes a pre-release suffix:
///
/// | tag        | normalized     |
/// |------------|----------------|
/// | `1`        | `1.0.0`        |
/// | `1.21`     | `1.21.0`       |
/// | `1.21rc1`  | `1.21.0-rc1`   |
/// | `1.9beta2` | `1.9.0-beta2`  |
/// | `1.2.3rc1` | `1.2.3-rc1`    |
/// | `1.21.0`   | `1.21.0`       |
///
/// Tags with more than three sections are returned unchanged. The result is
/// not guaranteed to parse; unusual tags are handled by [`sort_newest_first`].
#[must_use]
pub fn normalize(tag: &str) -> String {
    let split = PRERELEASE_MARKERS
        .iter()
        .filter_map(|marker| tag.find(marker))
        .min()
        .unwrap_or(tag.len());
    let (release, prerelease) = tag.split_at(split);

    let sections = release.split('.').count();
    if sections > 3 {
        return tag.to_string();
    }

    let mut normalized = release.to_string();
    for _ in sections..3 {
        normalized.push_str(".0");
    }
    if !prerelease.is_empty() {
        normalized.push('-');
        normalized.push_str(prerelease);
    }
    normalized
}

/// Extracts release tags from a reference listing.
///
/// Lines that are not exactly two whitespace-separated fields, or whose ref
/// does not carry [`TAG_PREFIX`], are skipped.
#[must_use]
pub fn parse_reference_listing(listing: &str) -> Vec<VersionTag> {
    listing
        .lines()
        .filter_map(|line| {
            let fields: Vec<&str> = line.split_whitespace().collect();
            let [_commit, reference] = fields.as_slice() else {
                return None;
            };
            let (_, tag) = reference.split_once(TAG_PREFIX)?;
            (!tag.is_empty()).then(|| VersionTag::new(tag))
        })
        .collect()
}

/// Sorts tags newest first by their normalized form.
///
/// Tags whose normalized form is not a valid version are placed after all
/// valid ones, in descending string order. The sort is stable.
pub fn sort_newest_first(tags: &mut Vec<VersionTag>) {
    let mut keyed: Vec<(Option<semver::Version>, VersionTag)> = tags
        .drain(..)
        .map(|tag| (semver::Version::parse(&tag.normalized()).ok(), tag))
        .collect();

    keyed.sort_by(|(a_ver, a), (b_ver, b)| match (a_ver, b_ver) {
        (Some(a_ver), Some(b_ver)) => b_ver.cmp(a_ver),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => b.as_str().cmp(a.as_str()),
    });

    tags.extend(keyed.into_iter().map(|(_, tag)| tag));
}

/// Returns `true` if a cache entry last modified at `modified` is still usable at `now`.
///
/// A modification time in the future counts as fresh.
#[must_use]
pub fn is_fresh(modified: SystemTime, now: SystemTime) -> bool {
    now.duration_since(modified)
        .map_or(true, |age| age < CACHE_TTL)
}

/// Lists available releases, backed by a cached reference listing.
pub struct VersionCatalog<'a, T: Transport + ?Sized> {
    transport: &'a T,
    source_url: String,
    cache_file: PathBuf,
}

impl<'a, T: Transport + ?Sized> VersionCatalog<'a, T> {
    /// Creates a catalog reading `source_url` and caching it at `cache_file`.
    pub fn new(
        transport: &'a T,
        source_url: impl Into<String>,
        cache_file: impl Into<PathBuf>,
    ) -> Self {
        Self {
            transport,
            source_url: source_url.into(),
            cache_file: cache_file.into(),
        }
    }

    /// Path of the cached reference listing.
    #[must_use]
    pub fn cache_file(&self) -> &Path {
        &self.cache_file
    }

    /// Returns every release tag, newest first.
    ///
    /// The cached listing is used if it is younger than [`CACHE_TTL`];
    /// otherwise it is fetched again and the cache overwritten.
    ///
    /// # Errors
    ///
    /// - [`InstallError::Network`] or [`InstallError::HttpStatus`] if the
    ///   listing had to be fetched and could not be. The cache is left as it was.
    /// - [`InstallError::CacheRead`] if the fresh cache cannot be read.
    /// - [`InstallError::CacheWrite`] if a fetched listing cannot be stored.
    pub fn list_versions(&self) -> Result<Vec<VersionTag>> {
        let listing = if self.cache_is_fresh() {
            debug!(path = %self.cache_file.display(), "Using cached reference listing");
            fs::read(&self.cache_file).map_err(|source| InstallError::CacheRead {
                path: self.cache_file.clone(),
                source,
            })?
        } else {
            self.fetch_listing()?
        };
        Ok(Self::tags_from(&listing))
    }

    /// Fetches the listing regardless of cache age and returns the tags, newest first.
    ///
    /// # Errors
    ///
    /// Same as [`VersionCatalog::list_versions`], minus `CacheRead`.
    pub fn refresh(&self) -> Result<Vec<VersionTag>> {
        let listing = self.fetch_listing()?;
        Ok(Self::tags_from(&listing))
    }

    /// Returns the newest tag that is not a beta or release candidate.
    ///
    /// # Errors
    ///
    /// Same as [`VersionCatalog::list_versions`].
    pub fn latest_stable(&self) -> Result<Option<VersionTag>> {
        Ok(self
            .list_versions()?
            .into_iter()
            .find(|tag| !tag.is_prerelease()))
    }

    /// Invalid UTF-8 only ever appears in refs we skip, so it is decoded lossily.
    fn tags_from(listing: &[u8]) -> Vec<VersionTag> {
        let mut tags = parse_reference_listing(&String::from_utf8_lossy(listing));
        sort_newest_first(&mut tags);
        tags
    }

    fn cache_is_fresh(&self) -> bool {
        fs::metadata(&self.cache_file)
            .and_then(|meta| meta.modified())
            .is_ok_and(|modified| is_fresh(modified, SystemTime::now()))
    }

    fn fetch_listing(&self) -> Result<Vec<u8>> {
        info!(url = %self.source_url, "Fetching reference listing");
        let mut response = self.transport.get(&self.source_url)?;
        if !response.is_success() {
            return Err(InstallError::HttpStatus {
                url: self.source_url.clone(),
                code: response.status,
            });
        }

        let mut listing = Vec::new();
        response
            .body
            .read_to_end(&mut listing)
            .map_err(|e| InstallError::network(&self.source_url, e))?;

        self.store(&listing)?;
        Ok(listing)
    }

    /// Replaces the cache file wholesale, byte for byte, through a temporary sibling.
    fn store(&self, listing: &[u8]) -> Result<()> {
        let cache_write = |source| InstallError::CacheWrite {
            path: self.cache_file.clone(),
            source,
        };

        if let Some(parent) = self.cache_file.parent() {
            fs::create_dir_all(parent).map_err(cache_write)?;
        }
        let tmp = self.cache_file.with_extension("tmp");
        fs::write(&tmp, listing).map_err(cache_write)?;
        fs::rename(&tmp, &self.cache_file).map_err(cache_write)?;

        debug!(path = %self.cache_file.display(), bytes = listing.len(), "Cached reference listing");
        Ok(())
    }
}
