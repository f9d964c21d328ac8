//! Versions command for the gofetch CLI.
//!
//! Lists Go releases from the upstream tag listing, newest first.
//!
//! ## Usage
//!
//! ```bash
//! gofetch versions                       # Stable releases
//! gofetch versions --include-prerelease  # Also beta and rc tags
//! gofetch versions --json                # Output in JSON format
//! ```
//!
//! ## Output Format
//!
//! ```text
//! Available Go versions:
//!
//!   go1.21.0 *
//!   go1.20.7
//!   go1.20.6
//!
//!   * = latest
//! ```

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use crate::config::{Config, Overrides};
use crate::errors::{InStage, Stage};
use crate::toolchain::GoVersion;
use crate::toolchain::resolver::list_versions;

/// Arguments for the versions command.
#[derive(Args, Debug, Default)]
pub struct VersionsArgs {
    /// Include beta and release-candidate tags.
    #[clap(long)]
    pub include_prerelease: bool,

    /// Show versions in JSON format.
    #[clap(long, short = 'j')]
    pub json: bool,
}

/// Version information for JSON output.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
struct VersionInfo {
    version: String,
    semver: String,
    prerelease: bool,
    latest: bool,
}

/// Executes the versions command.
///
/// # Errors
///
/// Returns an error if the tag listing fails or JSON output cannot be
/// serialized.
pub async fn execute(args: &VersionsArgs) -> Result<()> {
    let config = Config::load(&Overrides {
        include_prerelease: args.include_prerelease,
        ..Overrides::default()
    })?;

    let versions = list_versions(&config).await.in_stage(Stage::Resolve)?;
    let infos = version_infos(&versions, args.include_prerelease);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&infos)?);
    } else {
        output_text(&infos);
    }

    Ok(())
}

/// Filters and annotates versions; the first entry is the latest.
fn version_infos(versions: &[GoVersion], include_prerelease: bool) -> Vec<VersionInfo> {
    versions
        .iter()
        .filter(|v| include_prerelease || !v.is_prerelease())
        .enumerate()
        .map(|(i, v)| VersionInfo {
            version: v.tag().to_string(),
            semver: v.semver().to_string(),
            prerelease: v.is_prerelease(),
            latest: i == 0,
        })
        .collect()
}

fn output_text(infos: &[VersionInfo]) {
    if infos.is_empty() {
        println!("No versions available.");
        return;
    }

    println!("Available Go versions:");
    println!();
    for info in infos {
        let marker = if info.latest { " *" } else { "" };
        let kind = if info.prerelease { " (prerelease)" } else { "" };
        println!("  {}{kind}{marker}", info.version);
    }
    println!();
    println!("  * = latest");
}
