//! Detection of an existing Go installation.
//!
//! A release tarball unpacks to `<install dir>/go`, whose `VERSION` file
//! starts with the release tag. Trees without that file are asked directly
//! through `go version`. Detection is best effort: anything unreadable counts
//! as "nothing installed".

use std::path::{Path, PathBuf};
use std::process::Stdio;

use super::resolver::GoVersion;

/// Name of the toolchain directory inside the install directory.
pub const TREE_DIR: &str = "go";

/// The `bin` directory of the toolchain installed under `install_dir`.
#[must_use]
pub fn bin_dir(install_dir: &Path) -> PathBuf {
    install_dir.join(TREE_DIR).join("bin")
}

/// Returns the version of the toolchain under `install_dir`, if any.
pub async fn installed_version(install_dir: &Path) -> Option<GoVersion> {
    let tree = install_dir.join(TREE_DIR);
    if !tree.is_dir() {
        return None;
    }

    match tokio::fs::read_to_string(tree.join("VERSION")).await {
        Ok(content) => {
            if let Some(version) = parse_version_file(&content) {
                tracing::debug!(%version, "installed version from VERSION file");
                return Some(version);
            }
        }
        Err(e) => tracing::debug!(error = %e, "no readable VERSION file"),
    }

    let go = bin_dir(install_dir).join(format!("go{}", std::env::consts::EXE_SUFFIX));
    let output = tokio::process::Command::new(&go)
        .arg("version")
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output()
        .await;
    match output {
        Ok(output) if output.status.success() => {
            let version = parse_go_version_output(&String::from_utf8_lossy(&output.stdout));
            tracing::debug!(?version, go = %go.display(), "installed version from go version");
            version
        }
        Ok(output) => {
            tracing::debug!(status = %output.status, "go version failed");
            None
        }
        Err(e) => {
            tracing::debug!(error = %e, go = %go.display(), "could not run go version");
            None
        }
    }
}

/// First line of a `VERSION` file, e.g. `go1.21.0`.
fn parse_version_file(content: &str) -> Option<GoVersion> {
    content.lines().next().and_then(|line| GoVersion::from_tag(line.trim()))
}

/// Third word of `go version go1.21.0 linux/amd64`.
fn parse_go_version_output(output: &str) -> Option<GoVersion> {
    output.split_whitespace().nth(2).and_then(GoVersion::from_tag)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_file_first_line() {
        let version = parse_version_file("go1.21.0\ntime 2023-08-08T15:00:00Z\n").unwrap();
        assert_eq!(version.tag(), "go1.21.0");
        assert!(parse_version_file("devel +abc123\n").is_none());
        assert!(parse_version_file("").is_none());
    }

    #[test]
    fn go_version_output() {
        let version = parse_go_version_output("go version go1.20.7 linux/amd64\n").unwrap();
        assert_eq!(version.tag(), "go1.20.7");
        assert!(parse_go_version_output("go version").is_none());
    }

    #[tokio::test]
    async fn reads_version_file_of_installed_tree() {
        let temp = assert_fs::TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("go/bin")).unwrap();
        std::fs::write(temp.path().join("go/VERSION"), "go1.21.0\n").unwrap();

        let version = installed_version(temp.path()).await.unwrap();
        assert_eq!(version, GoVersion::from_tag("go1.21.0").unwrap());
    }

    #[tokio::test]
    async fn nothing_installed() {
        let temp = assert_fs::TempDir::new().unwrap();
        assert!(installed_version(temp.path()).await.is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn falls_back_to_go_version() {
        use std::os::unix::fs::PermissionsExt;

        let temp = assert_fs::TempDir::new().unwrap();
        let bin = bin_dir(temp.path());
        std::fs::create_dir_all(&bin).unwrap();
        let go = bin.join("go");
        std::fs::write(&go, "#!/bin/sh\necho 'go version go1.20.7 linux/amd64'\n").unwrap();
        std::fs::set_permissions(&go, std::fs::Permissions::from_mode(0o755)).unwrap();

        let version = installed_version(temp.path()).await.unwrap();
        assert_eq!(version.tag(), "go1.20.7");
    }
}
