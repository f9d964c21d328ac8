//! Toolchain installation.
//!
//! Unix-like systems get the release tarball extracted into the install
//! directory. Windows runs the `.msi` through `msiexec` in silent mode. Any
//! other OS is rejected.

use std::path::Path;

use super::installed::TREE_DIR;
use super::platform::InstallKind;
use super::privilege::Privilege;
use crate::config::Config;
use crate::errors::GofetchError;

/// Silent-install flag passed to `msiexec`.
const MSIEXEC_QUIET: &str = "/quiet";

/// `msiexec`: the user cancelled the installation or the UAC prompt.
const MSI_USER_EXIT: i32 = 1602;

/// `msiexec`: insufficient privileges to complete the installation.
const MSI_INSUFFICIENT_PRIVILEGES: i32 = 1925;

/// Installs the downloaded release file at `file` for `config.platform`.
///
/// # Errors
///
/// Returns an unsupported error for an OS without an install strategy, a
/// permission error if elevation is refused, and an I/O error if extraction
/// or the installer fails.
pub async fn install(file: &Path, config: &Config) -> Result<(), GofetchError> {
    match config.platform.install_kind() {
        InstallKind::Archive => install_archive(file, &config.install_dir).await,
        InstallKind::WindowsInstaller => run_windows_installer(file).await,
        InstallKind::Unsupported => Err(GofetchError::unsupported(format!(
            "no install strategy for {}",
            config.platform.os()
        ))),
    }
}

async fn install_archive(file: &Path, install_dir: &Path) -> Result<(), GofetchError> {
    let existing = install_dir.join(TREE_DIR);
    if existing.exists() {
        tracing::warn!(
            path = %existing.display(),
            "an existing Go installation will be overwritten"
        );
    }

    let privilege = Privilege::acquire(install_dir).await?;
    tracing::info!(
        archive = %file.display(),
        dest = %install_dir.display(),
        elevated = privilege.is_elevated(),
        "extracting toolchain"
    );
    privilege.extract(file, install_dir).await
}

async fn run_windows_installer(file: &Path) -> Result<(), GofetchError> {
    let msiexec = which::which("msiexec")
        .map_err(|_| GofetchError::io_message("msiexec not found in PATH"))?;

    tracing::info!(installer = %file.display(), "running msiexec");
    let status = tokio::process::Command::new(msiexec)
        .arg("/package")
        .arg(file)
        .arg(MSIEXEC_QUIET)
        .status()
        .await
        .map_err(|e| GofetchError::io("failed to run msiexec", e))?;

    msiexec_result(status.code())
}

/// Maps an `msiexec` exit code to an install outcome.
fn msiexec_result(code: Option<i32>) -> Result<(), GofetchError> {
    match code {
        Some(0) => Ok(()),
        Some(MSI_USER_EXIT | MSI_INSUFFICIENT_PRIVILEGES) => Err(GofetchError::permission(
            "the Windows installer was not granted administrator rights",
        )),
        Some(code) => Err(GofetchError::io_message(format!(
            "msiexec failed with exit code {code}"
        ))),
        None => Err(GofetchError::io_message("msiexec was terminated")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FileConfig, Overrides};
    use std::path::PathBuf;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn config(os: &str, install_dir: &Path) -> Config {
        let overrides = Overrides {
            os: Some(os.to_string()),
            arch: Some("amd64".to_string()),
            install_dir: Some(install_dir.to_path_buf()),
            ..Overrides::default()
        };
        Config::from_sources(&overrides, &no_env, FileConfig::default(), PathBuf::from("/tmp"))
            .unwrap()
    }

    #[test]
    fn msiexec_codes_map_to_error_kinds() {
        assert!(msiexec_result(Some(0)).is_ok());
        assert!(matches!(
            msiexec_result(Some(1602)),
            Err(GofetchError::Permission { .. })
        ));
        assert!(matches!(
            msiexec_result(Some(1925)),
            Err(GofetchError::Permission { .. })
        ));
        assert!(matches!(
            msiexec_result(Some(1603)),
            Err(GofetchError::Io { .. })
        ));
    }

    #[tokio::test]
    async fn unknown_os_is_unsupported() {
        let temp = assert_fs::TempDir::new().unwrap();
        let err = install(&temp.path().join("go.tar.gz"), &config("plan9", temp.path()))
            .await
            .unwrap_err();
        assert!(matches!(err, GofetchError::Unsupported { .. }));
        assert_eq!(err.exit_code(), 9);
    }

    #[tokio::test]
    async fn corrupt_archive_fails_without_partial_tree() {
        let temp = assert_fs::TempDir::new().unwrap();
        let archive = temp.path().join("go.tar.gz");
        std::fs::write(&archive, b"not an archive").unwrap();
        let prefix = temp.path().join("prefix");

        let err = install(&archive, &config("linux", &prefix)).await.unwrap_err();

        assert!(matches!(err, GofetchError::Io { .. }));
        assert!(!prefix.join("go").exists());
    }
}
