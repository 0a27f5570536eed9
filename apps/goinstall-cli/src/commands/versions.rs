//! Versions command for the goinstall CLI.
//!
//! Lists Go release tags from the reference listing, newest first.
//!
//! ## Usage
//!
//! ```bash
//! goinstall versions              # All releases, cached for 72 hours
//! goinstall versions --stable     # Skip betas and release candidates
//! goinstall versions --refresh    # Ignore the cache
//! goinstall versions --json -n 5  # Five newest, as JSON
//! ```

use anyhow::Result;
use clap::Args;
use goinstall::{InstallPipeline, VersionTag};
use serde::Serialize;

use super::load_config;
use crate::GlobalArgs;

/// Arguments for the versions command.
#[derive(Args)]
pub struct VersionsArgs {
    /// Show only stable versions.
    #[clap(long, short = 's')]
    pub stable: bool,

    /// Show versions in JSON format.
    #[clap(long, short = 'j')]
    pub json: bool,

    /// Fetch the listing from upstream even if the cache is fresh.
    #[clap(long)]
    pub refresh: bool,

    /// Show at most N versions.
    #[clap(long, short = 'n', value_name = "N")]
    pub limit: Option<usize>,
}

/// Version information for JSON output.
#[derive(Debug, Clone, Serialize)]
struct VersionInfo {
    version: String,
    stable: bool,
}

/// Executes the versions command.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or the listing can be
/// neither read from the cache nor fetched.
pub fn execute(global: &GlobalArgs, args: &VersionsArgs) -> Result<()> {
    let pipeline = InstallPipeline::from_config(load_config(global)?)?;
    let catalog = pipeline.catalog();
    let tags = if args.refresh {
        catalog.refresh()?
    } else {
        catalog.list_versions()?
    };

    let selected = select(tags, args.stable, args.limit);
    if args.json {
        output_json(&selected)?;
    } else {
        output_text(&selected, args.stable);
    }
    Ok(())
}

fn select(tags: Vec<VersionTag>, stable_only: bool, limit: Option<usize>) -> Vec<VersionTag> {
    tags.into_iter()
        .filter(|tag| !stable_only || !tag.is_prerelease())
        .take(limit.unwrap_or(usize::MAX))
        .collect()
}

fn output_json(tags: &[VersionTag]) -> Result<()> {
    let infos: Vec<VersionInfo> = tags
        .iter()
        .map(|tag| VersionInfo {
            version: tag.to_string(),
            stable: !tag.is_prerelease(),
        })
        .collect();

    let json = serde_json::to_string_pretty(&infos)?;
    println!("{json}");
    Ok(())
}

fn output_text(tags: &[VersionTag], stable_only: bool) {
    if tags.is_empty() {
        if stable_only {
            println!("No stable versions available.");
        } else {
            println!("No versions available.");
        }
        return;
    }

    for tag in tags {
        if tag.is_prerelease() {
            println!("{tag} (prerelease)");
        } else {
            println!("{tag}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(raw: &[&str]) -> Vec<VersionTag> {
        raw.iter().copied().map(VersionTag::from).collect()
    }

    #[test]
    fn select_filters_prereleases_before_limiting() {
        let all = tags(&["1.22rc1", "1.21.5", "1.21rc2", "1.21.4", "1.20"]);
        let picked = select(all, true, Some(2));
        assert_eq!(picked, tags(&["1.21.5", "1.21.4"]));
    }

    #[test]
    fn select_without_options_keeps_everything() {
        let all = tags(&["1.22rc1", "1.21.5"]);
        assert_eq!(select(all.clone(), false, None), all);
    }
}
