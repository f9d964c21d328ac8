//! Elevation for writing into system directories.
//!
//! Installing into `/usr/local` normally needs root. A [`Privilege`] is
//! acquired once, right before extraction, and then used for that one
//! extraction. When the install directory is already writable no elevation
//! happens at all.
//!
//! Elevated extraction re-runs this binary as `sudo -n gofetch unpack
//! <archive> <dir>`, so only the unpack step runs as root. The child's exit
//! code carries its error kind back to the parent.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use super::archive::extract_tar_gz;
use super::installed::TREE_DIR;
use crate::errors::GofetchError;

/// Exit code `sudo` itself uses when it refuses to run a command.
const SUDO_REFUSED: i32 = 1;

/// How the install directory will be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Privilege {
    /// The current user can write the install directory.
    Direct,
    /// Writes go through `sudo`, whose credentials are already cached.
    Sudo {
        /// Path of the `sudo` executable.
        program: PathBuf,
    },
}

impl Privilege {
    /// Acquires the right to write into `install_dir`.
    ///
    /// Prompts for a password through `sudo -v` when the directory is not
    /// writable by the current user.
    ///
    /// # Errors
    ///
    /// Returns a permission error if elevation is needed but `sudo` is not
    /// installed or the user does not authenticate.
    pub async fn acquire(install_dir: &Path) -> Result<Self, GofetchError> {
        if is_root() || can_install_into(install_dir) {
            tracing::debug!(dir = %install_dir.display(), "install directory is writable");
            return Ok(Self::Direct);
        }

        let program = which::which("sudo").map_err(|_| {
            GofetchError::permission(format!(
                "{} is not writable and sudo is not available",
                install_dir.display()
            ))
        })?;

        eprintln!(
            "Administrator rights are needed to write to {}.",
            install_dir.display()
        );
        tracing::info!(dir = %install_dir.display(), "requesting elevation");

        let status = tokio::process::Command::new(&program)
            .arg("-v")
            .status()
            .await
            .map_err(|e| GofetchError::io("failed to run sudo", e))?;

        if !status.success() {
            return Err(GofetchError::permission(format!(
                "elevation to write {} was refused",
                install_dir.display()
            )));
        }

        Ok(Self::Sudo { program })
    }

    /// Returns whether writes go through `sudo`.
    #[must_use]
    pub fn is_elevated(&self) -> bool {
        matches!(self, Self::Sudo { .. })
    }

    /// Extracts `archive` into `dest_dir` with this privilege.
    ///
    /// # Errors
    ///
    /// Returns the extraction error, or a permission error if `sudo` refuses
    /// the elevated child.
    pub async fn extract(&self, archive: &Path, dest_dir: &Path) -> Result<(), GofetchError> {
        match self {
            Self::Direct => extract_tar_gz(archive, dest_dir).map(|_| ()),
            Self::Sudo { program } => {
                let exe = std::env::current_exe()
                    .map_err(|e| GofetchError::io("cannot locate the gofetch executable", e))?;
                tracing::debug!(exe = %exe.display(), "running elevated unpack");

                let status = tokio::process::Command::new(program)
                    .arg("-n")
                    .arg(&exe)
                    .arg("unpack")
                    .arg(archive)
                    .arg(dest_dir)
                    .stdin(Stdio::null())
                    .status()
                    .await
                    .map_err(|e| GofetchError::io("failed to run sudo", e))?;

                match status.code() {
                    Some(0) => Ok(()),
                    Some(SUDO_REFUSED) => Err(GofetchError::permission(
                        "sudo refused to run the elevated unpack",
                    )),
                    Some(code) => Err(GofetchError::from_exit_code(
                        code,
                        format!(
                            "elevated unpack of {} into {} failed with exit code {code}",
                            archive.display(),
                            dest_dir.display()
                        ),
                    )),
                    None => Err(GofetchError::cancelled(
                        "elevated unpack was terminated by a signal",
                    )),
                }
            }
        }
    }
}

#[cfg(unix)]
fn is_root() -> bool {
    // SAFETY: geteuid has no preconditions and cannot fail.
    unsafe { libc::geteuid() == 0 }
}

#[cfg(not(unix))]
fn is_root() -> bool {
    false
}

/// Returns whether `install_dir` and an existing `go/` tree inside it are
/// both writable.
fn can_install_into(install_dir: &Path) -> bool {
    let tree = install_dir.join(TREE_DIR);
    is_writable(install_dir) && (!tree.is_dir() || is_writable(&tree))
}

/// Probes writability of `dir`, or of its closest existing ancestor when it
/// does not exist yet.
fn is_writable(dir: &Path) -> bool {
    let Some(existing) = dir.ancestors().find(|p| p.is_dir()) else {
        return false;
    };
    let probe = existing.join(format!(".gofetch-probe-{}", std::process::id()));
    match std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&probe)
    {
        Ok(_) => {
            let _ = std::fs::remove_file(&probe);
            true
        }
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temp_dir_is_writable() {
        let temp = assert_fs::TempDir::new().unwrap();
        assert!(is_writable(temp.path()));
        assert_eq!(std::fs::read_dir(temp.path()).unwrap().count(), 0);
    }

    #[test]
    fn missing_dir_uses_existing_ancestor() {
        let temp = assert_fs::TempDir::new().unwrap();
        assert!(is_writable(&temp.path().join("not/yet/created")));
    }

    #[cfg(unix)]
    #[test]
    fn read_only_dir_is_not_writable() {
        use std::os::unix::fs::PermissionsExt;

        if is_root() {
            return;
        }
        let temp = assert_fs::TempDir::new().unwrap();
        let locked = temp.path().join("locked");
        std::fs::create_dir(&locked).unwrap();
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o555)).unwrap();

        assert!(!is_writable(&locked));

        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755)).unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn read_only_go_tree_needs_elevation() {
        use std::os::unix::fs::PermissionsExt;

        if is_root() {
            return;
        }
        let temp = assert_fs::TempDir::new().unwrap();
        let tree = temp.path().join("go");
        std::fs::create_dir(&tree).unwrap();
        assert!(can_install_into(temp.path()));

        std::fs::set_permissions(&tree, std::fs::Permissions::from_mode(0o555)).unwrap();
        assert!(is_writable(temp.path()));
        assert!(!can_install_into(temp.path()));

        std::fs::set_permissions(&tree, std::fs::Permissions::from_mode(0o755)).unwrap();
    }

    #[tokio::test]
    async fn writable_dir_acquires_direct() {
        let temp = assert_fs::TempDir::new().unwrap();
        let privilege = Privilege::acquire(temp.path()).await.unwrap();
        assert_eq!(privilege, Privilege::Direct);
        assert!(!privilege.is_elevated());
    }
}
