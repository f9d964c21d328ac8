//! Install command for the gofetch CLI.
//!
//! Runs the whole pipeline: resolve the version, fetch the release index,
//! select the file for this platform, download it, verify its checksum and
//! install it.
//!
//! Nothing is downloaded when the install directory already holds the
//! requested version, unless `--force` is given.
//!
//! ## Usage
//!
//! ```bash
//! gofetch install                      # Latest stable release into /usr/local
//! gofetch install --version 1.21.0     # Specific release
//! gofetch install --prefix ~/.local    # Into ~/.local/go, no elevation
//! gofetch install --force              # Reinstall the same version
//! ```

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Args;

use crate::config::{Config, Overrides};
use crate::toolchain::installed::{bin_dir, installed_version};
use crate::toolchain::pipeline::{self, PipelineOptions};

/// Arguments for the install command.
#[derive(Args, Debug, Default)]
pub struct InstallArgs {
    /// Version to install (e.g., "go1.21.0" or "1.21.0").
    ///
    /// If omitted, the latest release is resolved from the Go repository.
    #[clap(long)]
    pub version: Option<String>,

    /// Directory the release file is downloaded to (default: current directory).
    #[clap(long, value_name = "PATH")]
    pub dest: Option<PathBuf>,

    /// Directory the toolchain is extracted into (default: /usr/local).
    #[clap(long, value_name = "DIR")]
    pub prefix: Option<PathBuf>,

    /// Install even if the checksum cannot be verified.
    #[clap(long)]
    pub skip_verify: bool,

    /// Consider beta and release-candidate tags when resolving the latest version.
    #[clap(long)]
    pub include_prerelease: bool,

    /// Reinstall even if this version is already installed.
    #[clap(long)]
    pub force: bool,
}

/// Executes the install command.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or any pipeline stage
/// fails.
pub async fn execute(args: &InstallArgs, quiet: bool) -> Result<()> {
    let config = Config::load(&Overrides {
        download_dir: args.dest.clone(),
        install_dir: args.prefix.clone(),
        include_prerelease: args.include_prerelease,
        ..Overrides::default()
    })?;

    let options = PipelineOptions {
        version: args.version.clone(),
        skip_verify: args.skip_verify,
        download_only: false,
        quiet,
    };

    let version = pipeline::resolve_version(&config, &options).await?;

    if !args.force
        && let Some(current) = installed_version(&config.install_dir).await
        && current == version
    {
        tracing::info!(%version, dir = %config.install_dir.display(), "already installed");
        if !quiet {
            println!(
                "Go {version} is already installed in {}.",
                config.install_dir.display()
            );
        }
        return Ok(());
    }

    let outcome = pipeline::run_for(&config, &options, version).await?;

    if !quiet && let Some(dir) = &outcome.installed_to {
        let bin = bin_dir(dir);
        if !on_path(&bin, std::env::var_os("PATH")) {
            println!();
            println!("To use the toolchain, add it to your PATH:");
            #[cfg(windows)]
            println!("  {}", bin.display());
            #[cfg(not(windows))]
            println!("  export PATH=\"{}:$PATH\"", bin.display());
        }
    }

    Ok(())
}

/// Returns whether the first `go` found on `path_var` lives in `bin`.
fn on_path(bin: &Path, path_var: Option<OsString>) -> bool {
    let Ok(cwd) = std::env::current_dir() else {
        return false;
    };
    which::which_in("go", path_var, cwd).is_ok_and(|found| found.parent() == Some(bin))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    fn fake_go(bin: &Path) {
        use std::os::unix::fs::PermissionsExt;

        std::fs::create_dir_all(bin).unwrap();
        let go = bin.join("go");
        std::fs::write(&go, "#!/bin/sh\n").unwrap();
        std::fs::set_permissions(&go, std::fs::Permissions::from_mode(0o755)).unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn installed_bin_on_path_is_detected() {
        let temp = assert_fs::TempDir::new().unwrap();
        let bin = bin_dir(temp.path());
        fake_go(&bin);

        let path = std::env::join_paths([Path::new("/nonexistent"), bin.as_path()]).unwrap();
        assert!(on_path(&bin, Some(path)));
    }

    #[cfg(unix)]
    #[test]
    fn other_go_first_on_path_needs_hint() {
        let temp = assert_fs::TempDir::new().unwrap();
        let bin = bin_dir(&temp.path().join("new"));
        let other = bin_dir(&temp.path().join("old"));
        fake_go(&bin);
        fake_go(&other);

        let path = std::env::join_paths([other.as_path(), bin.as_path()]).unwrap();
        assert!(!on_path(&bin, Some(path)));
    }

    #[test]
    fn empty_path_needs_hint() {
        let temp = assert_fs::TempDir::new().unwrap();
        assert!(!on_path(&bin_dir(temp.path()), None));
    }
}
