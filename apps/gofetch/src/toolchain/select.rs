//! Asset selection for gofetch.
//!
//! Picks the one release file that belongs to the target platform and turns
//! it into an [`Asset`]: where to download it from, where to put it, and what
//! its checksum should be.
//!
//! How file names encode the platform is an external convention of the
//! release page, so it lives behind [`AssetNaming`] and can change without
//! touching the rest of the pipeline.

use std::path::PathBuf;

use url::Url;

use super::index::{Checksum, ReleaseIndex};
use super::platform::{InstallKind, Platform};
use crate::config::Config;
use crate::errors::GofetchError;

/// A release file chosen for download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    /// Local destination of the download.
    pub path: PathBuf,
    /// Published checksum of the file.
    pub checksum: Checksum,
    /// Where the file is downloaded from.
    pub url: Url,
}

impl Asset {
    /// The file name component of the destination path.
    #[must_use]
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Naming convention linking release file names to platforms.
pub trait AssetNaming {
    /// Returns whether `file_name` is built for `platform`.
    fn matches(&self, file_name: &str, platform: &Platform) -> bool;

    /// Returns whether `file_name` is the kind the installer consumes on
    /// `platform`. Used to choose between several matching files.
    fn is_preferred(&self, file_name: &str, platform: &Platform) -> bool;
}

/// The `go<version>.<os>-<arch>.<ext>` convention of the Go download page.
#[derive(Debug, Clone, Copy, Default)]
pub struct GoReleaseNaming;

impl GoReleaseNaming {
    /// Archive and installer extensions, longest first.
    const EXTENSIONS: [&'static str; 5] = [".tar.gz", ".tgz", ".zip", ".msi", ".pkg"];

    fn strip_extension(file_name: &str) -> &str {
        Self::EXTENSIONS
            .iter()
            .find_map(|ext| file_name.strip_suffix(ext))
            .unwrap_or(file_name)
    }
}

impl AssetNaming for GoReleaseNaming {
    fn matches(&self, file_name: &str, platform: &Platform) -> bool {
        let stem = Self::strip_extension(file_name);
        let suffix = platform.suffix();
        stem.strip_suffix(&suffix)
            .is_some_and(|rest| rest.is_empty() || rest.ends_with(['.', '-', '_']))
    }

    fn is_preferred(&self, file_name: &str, platform: &Platform) -> bool {
        match platform.install_kind() {
            InstallKind::WindowsInstaller => file_name.ends_with(".msi"),
            InstallKind::Archive => file_name.ends_with(".tar.gz"),
            InstallKind::Unsupported => false,
        }
    }
}

/// Chooses the release file for `platform`.
///
/// Among the files `naming` matches, the first (in page order) of the kind
/// the installer prefers wins; without one, the first match wins.
///
/// # Errors
///
/// Returns a no-match error if no file is built for `platform`, and a parse
/// error if the chosen file name cannot be joined onto the base URL.
pub fn select_asset(
    index: &ReleaseIndex,
    config: &Config,
    naming: &dyn AssetNaming,
) -> Result<Asset, GofetchError> {
    let platform = &config.platform;
    let candidates: Vec<(&str, &Checksum)> = index
        .iter()
        .filter(|(name, _)| naming.matches(name, platform))
        .collect();

    let (file, checksum) = candidates
        .iter()
        .find(|(name, _)| naming.is_preferred(name, platform))
        .or_else(|| candidates.first())
        .copied()
        .ok_or_else(|| {
            GofetchError::no_match(format!(
                "{} has no release file for {platform}",
                index.version()
            ))
        })?;

    if candidates.len() > 1 {
        tracing::debug!(
            chosen = file,
            candidates = candidates.len(),
            "several release files match the platform"
        );
    }

    let url = config.download_base_url.join(file).map_err(|e| {
        GofetchError::parse(format!("cannot build download URL for {file}: {e}"))
    })?;

    Ok(Asset {
        path: config.download_dir.join(file),
        checksum: checksum.clone(),
        url,
    })
}
