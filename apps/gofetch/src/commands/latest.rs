//! Latest command for the gofetch CLI.
//!
//! Prints the newest Go release tag, e.g. `go1.21.0`.

use anyhow::Result;
use clap::Args;

use crate::config::{Config, Overrides};
use crate::errors::{InStage, Stage};
use crate::toolchain::resolver::resolve_latest;

/// Arguments for the latest command.
#[derive(Args, Debug, Default)]
pub struct LatestArgs {
    /// Consider beta and release-candidate tags.
    #[clap(long)]
    pub include_prerelease: bool,
}

/// Executes the latest command.
///
/// # Errors
///
/// Returns an error if the tag listing fails or holds no release tag.
pub async fn execute(args: &LatestArgs) -> Result<()> {
    let config = Config::load(&Overrides {
        include_prerelease: args.include_prerelease,
        ..Overrides::default()
    })?;

    let version = resolve_latest(&config).await.in_stage(Stage::Resolve)?;
    println!("{version}");
    Ok(())
}
