//! Hidden unpack command.
//!
//! The installer re-runs gofetch as `sudo -n gofetch unpack <ARCHIVE> <DIR>`
//! when the install directory needs root, so only extraction runs elevated.
//! Errors map to the same exit codes as the rest of the CLI, which lets the
//! parent process report the right kind.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use crate::toolchain::extract_tar_gz;

/// Arguments for the unpack command.
#[derive(Args, Debug)]
pub struct UnpackArgs {
    /// The tar.gz archive to extract.
    pub archive: PathBuf,

    /// Directory to extract into.
    pub dir: PathBuf,
}

/// Executes the unpack command.
///
/// # Errors
///
/// Returns an error if extraction fails.
pub fn execute(args: &UnpackArgs) -> Result<()> {
    let entries = extract_tar_gz(&args.archive, &args.dir)?;
    tracing::info!(entries, dir = %args.dir.display(), "unpacked");
    Ok(())
}
