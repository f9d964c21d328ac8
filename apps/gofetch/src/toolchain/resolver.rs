//! Latest-version resolution for gofetch.
//!
//! Go releases are identified by `go`-prefixed git tags in the upstream
//! repository (`go1.21.0`, `go1.20`, `go1.22rc1`). This module lists those
//! tags with `git ls-remote --tags`, parses them into [`GoVersion`]s and picks
//! the highest one.
//!
//! ## Ordering
//!
//! Tags are converted to semver before comparing, so `go1.10.0` ranks above
//! `go1.9.7` (numeric, not lexicographic). Missing components count as zero
//! (`go1.20` is `1.20.0`) and `beta`/`rc` markers become semver pre-releases
//! (`go1.22rc1` is `1.22.0-rc.1`), which rank below the final release.
//!
//! Pre-release tags are skipped when picking the latest version unless the
//! caller opts in.

use std::cmp::Ordering;
use std::fmt;
use std::process::Stdio;
use std::sync::LazyLock;

use regex::Regex;
use semver::{Prerelease, Version};

use crate::config::Config;
use crate::errors::GofetchError;

/// Prefix every release tag starts with.
pub const TAG_PREFIX: &str = "go";

/// Suffix `git ls-remote` appends to the peeled object of an annotated tag.
const PEELED_SUFFIX: &str = "^{}";

static VERSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+)(?:\.(\d+))?(?:\.(\d+))?(?:(alpha|beta|rc)(\d+))?$")
        .expect("version pattern is valid")
});

/// A Go release version parsed from a tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoVersion {
    tag: String,
    semver: Version,
}

impl GoVersion {
    /// Parses a full tag such as `go1.21.0`.
    ///
    /// Returns `None` when the tag lacks the `go` prefix or the remainder is
    /// not a Go version number.
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        let bare = tag.strip_prefix(TAG_PREFIX)?;
        Self::from_bare(bare)
    }

    /// Parses a version without its prefix (`1.21.0`), or with it.
    #[must_use]
    pub fn parse(input: &str) -> Option<Self> {
        let input = input.trim();
        Self::from_tag(input).or_else(|| Self::from_bare(input))
    }

    fn from_bare(bare: &str) -> Option<Self> {
        let caps = VERSION_RE.captures(bare)?;
        let number = |i: usize| -> Option<u64> {
            caps.get(i).map_or(Some(0), |m| m.as_str().parse().ok())
        };

        let mut semver = Version::new(number(1)?, number(2)?, number(3)?);
        if let (Some(kind), Some(n)) = (caps.get(4), caps.get(5)) {
            let n: u64 = n.as_str().parse().ok()?;
            semver.pre = Prerelease::new(&format!("{}.{n}", kind.as_str())).ok()?;
        }

        Some(Self {
            tag: format!("{TAG_PREFIX}{bare}"),
            semver,
        })
    }

    /// The tag exactly as published (`go1.22rc1`).
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// The version as semver, used for ordering.
    #[must_use]
    pub fn semver(&self) -> &Version {
        &self.semver
    }

    /// Returns whether this is a `beta` or `rc` build.
    #[must_use]
    pub fn is_prerelease(&self) -> bool {
        !self.semver.pre.is_empty()
    }
}

impl Ord for GoVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.semver
            .cmp(&other.semver)
            .then_with(|| self.tag.cmp(&other.tag))
    }
}

impl PartialOrd for GoVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for GoVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tag)
    }
}

/// Extracts tag names from `git ls-remote --tags` output.
///
/// Each line is `<hash>\t<ref>`. Peeled entries (`refs/tags/x^{}`) collapse
/// onto their tag and duplicates are dropped; first-seen order is kept.
#[must_use]
pub fn parse_ls_remote(output: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for line in output.lines() {
        let Some((_, reference)) = line.split_once('\t') else {
            continue;
        };
        let Some(name) = reference.trim().strip_prefix("refs/tags/") else {
            continue;
        };
        let name = name.strip_suffix(PEELED_SUFFIX).unwrap_or(name);
        if !name.is_empty() && !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
    names
}

/// Parses every release tag and sorts newest first.
///
/// Tags without the `go` prefix and malformed versions are dropped.
#[must_use]
pub fn sorted_versions<'a>(tags: impl IntoIterator<Item = &'a str>) -> Vec<GoVersion> {
    let mut versions: Vec<GoVersion> = tags.into_iter().filter_map(GoVersion::from_tag).collect();
    versions.sort_by(|a, b| b.cmp(a));
    versions
}

/// Picks the highest release tag.
///
/// Pre-release tags are considered only when `include_prerelease` is set.
#[must_use]
pub fn latest_version<'a>(
    tags: impl IntoIterator<Item = &'a str>,
    include_prerelease: bool,
) -> Option<GoVersion> {
    tags.into_iter()
        .filter_map(GoVersion::from_tag)
        .filter(|v| include_prerelease || !v.is_prerelease())
        .max()
}

/// Lists tag names in the configured repository.
///
/// # Errors
///
/// Returns an I/O error if `git` is not installed, and a network error if
/// the listing fails or exceeds the configured timeout.
pub async fn list_remote_tags(config: &Config) -> Result<Vec<String>, GofetchError> {
    let git = which::which("git")
        .map_err(|_| GofetchError::io_message("git executable not found in PATH"))?;

    tracing::debug!(repo = %config.repo_url, "listing remote tags");

    let child = tokio::process::Command::new(git)
        .args(["ls-remote", "--tags", config.repo_url.as_str()])
        .env("GIT_TERMINAL_PROMPT", "0")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| GofetchError::io("failed to run git ls-remote", e))?;

    let output = tokio::time::timeout(config.git_timeout, child.wait_with_output())
        .await
        .map_err(|_| {
            GofetchError::network(format!(
                "listing tags of {} timed out after {}s",
                config.repo_url,
                config.git_timeout.as_secs()
            ))
        })?
        .map_err(|e| GofetchError::io("failed to read git ls-remote output", e))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(GofetchError::network(format!(
            "cannot list tags of {}: {}",
            config.repo_url,
            stderr.trim()
        )));
    }

    let tags = parse_ls_remote(&String::from_utf8_lossy(&output.stdout));
    tracing::debug!(count = tags.len(), "remote tags listed");
    Ok(tags)
}

/// Resolves the latest release from the configured repository.
///
/// # Errors
///
/// Returns a network error if the listing fails, and a no-match error if no
/// tag carries the `go` prefix and a parsable version.
pub async fn resolve_latest(config: &Config) -> Result<GoVersion, GofetchError> {
    let tags = list_remote_tags(config).await?;
    let latest = latest_version(tags.iter().map(String::as_str), config.include_prerelease)
        .ok_or_else(|| {
            GofetchError::no_match(format!(
                "no `{TAG_PREFIX}` release tag found in {}",
                config.repo_url
            ))
        })?;
    tracing::info!(version = %latest, "resolved latest version");
    Ok(latest)
}

/// Lists every release in the configured repository, newest first.
///
/// # Errors
///
/// Returns a network error if the listing fails.
pub async fn list_versions(config: &Config) -> Result<Vec<GoVersion>, GofetchError> {
    let tags = list_remote_tags(config).await?;
    Ok(sorted_versions(tags.iter().map(String::as_str)))
}
