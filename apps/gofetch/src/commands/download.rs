//! Download command for the gofetch CLI.
//!
//! Same as `install` but stops after the checksum is verified, leaving the
//! release file in the destination directory. `--os` and `--arch` fetch the
//! file for another platform.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use crate::config::{Config, Overrides};
use crate::toolchain::pipeline::{self, PipelineOptions};

/// Arguments for the download command.
#[derive(Args, Debug, Default)]
pub struct DownloadArgs {
    /// Version to download (e.g., "go1.21.0" or "1.21.0").
    #[clap(long)]
    pub version: Option<String>,

    /// Directory the release file is downloaded to (default: current directory).
    #[clap(long, value_name = "PATH")]
    pub dest: Option<PathBuf>,

    /// Keep the file even if the checksum cannot be verified.
    #[clap(long)]
    pub skip_verify: bool,

    /// Consider beta and release-candidate tags when resolving the latest version.
    #[clap(long)]
    pub include_prerelease: bool,

    /// Target operating system in Go naming (e.g., "linux", "darwin").
    #[clap(long)]
    pub os: Option<String>,

    /// Target architecture in Go naming (e.g., "amd64", "arm64").
    #[clap(long)]
    pub arch: Option<String>,
}

/// Executes the download command.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or any stage up to
/// verification fails.
pub async fn execute(args: &DownloadArgs, quiet: bool) -> Result<()> {
    let config = Config::load(&Overrides {
        download_dir: args.dest.clone(),
        include_prerelease: args.include_prerelease,
        os: args.os.clone(),
        arch: args.arch.clone(),
        ..Overrides::default()
    })?;

    let options = PipelineOptions {
        version: args.version.clone(),
        skip_verify: args.skip_verify,
        download_only: true,
        quiet,
    };

    let outcome = pipeline::run(&config, &options).await?;
    if quiet {
        println!("{}", outcome.asset.path.display());
    } else {
        let checksum = if outcome.verified {
            "verified"
        } else {
            "not verified"
        };
        println!(
            "{} ({} bytes, checksum {checksum})",
            outcome.version, outcome.bytes
        );
    }

    Ok(())
}
