//! Runtime configuration for gofetch.
//!
//! A [`Config`] is resolved once at start-up and passed by reference to every
//! pipeline stage. Each setting is taken from the first source that provides
//! it:
//!
//! 1. Command-line flag
//! 2. Environment variable (`GOFETCH_*`)
//! 3. Config file (`<config dir>/gofetch/config.toml`, or `GOFETCH_CONFIG`)
//! 4. Built-in default
//!
//! ## Environment Variables
//!
//! - `GOFETCH_REPO_URL`: Git repository whose tags name the releases
//! - `GOFETCH_DL_URL`: Base URL release files are downloaded from
//! - `GOFETCH_INDEX_URL`: Release index page (defaults to `GOFETCH_DL_URL`)
//! - `GOFETCH_PREFIX`: Directory the toolchain is extracted into
//! - `GOFETCH_OS` / `GOFETCH_ARCH`: Override the detected platform
//! - `GOFETCH_CONFIG`: Explicit config file path
//!
//! Empty or whitespace-only values are treated as unset.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use url::Url;

use crate::toolchain::Platform;

pub const REPO_URL_ENV: &str = "GOFETCH_REPO_URL";
pub const DL_URL_ENV: &str = "GOFETCH_DL_URL";
pub const INDEX_URL_ENV: &str = "GOFETCH_INDEX_URL";
pub const PREFIX_ENV: &str = "GOFETCH_PREFIX";
pub const OS_ENV: &str = "GOFETCH_OS";
pub const ARCH_ENV: &str = "GOFETCH_ARCH";
pub const CONFIG_ENV: &str = "GOFETCH_CONFIG";

/// Repository whose `go*` tags identify releases.
const DEFAULT_REPO_URL: &str = "https://github.com/golang/go";

/// Base URL for the release index and release files.
const DEFAULT_DL_URL: &str = "https://golang.org/dl/";

#[cfg(windows)]
const DEFAULT_INSTALL_DIR: &str = r"C:\Program Files";
#[cfg(not(windows))]
const DEFAULT_INSTALL_DIR: &str = "/usr/local";

const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 1800;
const DEFAULT_GIT_TIMEOUT_SECS: u64 = 60;

/// Fully resolved settings for one run.
#[derive(Debug, Clone)]
pub struct Config {
    /// Platform whose release file is selected and installed.
    pub platform: Platform,
    /// Git repository listed with `git ls-remote --tags`.
    pub repo_url: String,
    /// Release index page.
    pub index_url: Url,
    /// Base URL release file names are joined onto. Always ends with `/`.
    pub download_base_url: Url,
    /// Directory the release file is written to.
    pub download_dir: PathBuf,
    /// Directory the archive is extracted into.
    pub install_dir: PathBuf,
    /// Whether `beta`/`rc` tags may be picked as the latest version.
    pub include_prerelease: bool,
    /// TCP connect timeout for HTTP requests.
    pub connect_timeout: Duration,
    /// Whole-request timeout for HTTP requests, including the body.
    pub request_timeout: Duration,
    /// Upper bound on `git ls-remote`.
    pub git_timeout: Duration,
}

/// Values given on the command line. `None` means "not given".
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub download_dir: Option<PathBuf>,
    pub install_dir: Option<PathBuf>,
    pub include_prerelease: bool,
    pub os: Option<String>,
    pub arch: Option<String>,
}

/// On-disk configuration file. Every key is optional.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub repo_url: Option<String>,
    pub download_base_url: Option<String>,
    pub index_url: Option<String>,
    pub install_dir: Option<PathBuf>,
    pub include_prerelease: Option<bool>,
    pub connect_timeout_secs: Option<u64>,
    pub request_timeout_secs: Option<u64>,
    pub git_timeout_secs: Option<u64>,
}

impl FileConfig {
    /// Reads and parses a TOML config file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid TOML for
    /// this schema.
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }
}

impl Config {
    /// Resolves the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but is invalid, a URL does
    /// not parse, or the current directory cannot be determined.
    pub fn load(overrides: &Overrides) -> Result<Self> {
        let file = match config_file_path() {
            Some(path) if path.exists() => {
                tracing::debug!(path = %path.display(), "loading config file");
                FileConfig::from_path(&path)?
            }
            _ => FileConfig::default(),
        };
        let cwd = std::env::current_dir().context("Cannot determine current directory")?;
        Self::from_sources(overrides, &env_value, file, cwd)
    }

    /// Merges all sources. `env` looks up an environment variable by name.
    ///
    /// # Errors
    ///
    /// Returns an error if a configured URL does not parse.
    pub fn from_sources(
        overrides: &Overrides,
        env: &dyn Fn(&str) -> Option<String>,
        file: FileConfig,
        cwd: PathBuf,
    ) -> Result<Self> {
        let detected = Platform::detect();
        let os = overrides
            .os
            .clone()
            .or_else(|| env(OS_ENV))
            .unwrap_or_else(|| detected.os().to_string());
        let arch = overrides
            .arch
            .clone()
            .or_else(|| env(ARCH_ENV))
            .unwrap_or_else(|| detected.arch().to_string());

        let repo_url = env(REPO_URL_ENV)
            .or(file.repo_url)
            .unwrap_or_else(|| DEFAULT_REPO_URL.to_string());

        let download_base = env(DL_URL_ENV)
            .or(file.download_base_url)
            .unwrap_or_else(|| DEFAULT_DL_URL.to_string());
        let download_base_url = parse_base_url(&download_base)?;

        let index_url = match env(INDEX_URL_ENV).or(file.index_url) {
            Some(url) => Url::parse(url.trim())
                .with_context(|| format!("Invalid release index URL: {url}"))?,
            None => download_base_url.clone(),
        };

        let install_dir = overrides
            .install_dir
            .clone()
            .or_else(|| env(PREFIX_ENV).map(PathBuf::from))
            .or(file.install_dir)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_INSTALL_DIR));

        let download_dir = match overrides.download_dir.clone() {
            Some(dir) if dir.is_relative() => cwd.join(dir),
            Some(dir) => dir,
            None => cwd,
        };

        Ok(Self {
            platform: Platform::new(&os, &arch),
            repo_url,
            index_url,
            download_base_url,
            download_dir,
            install_dir,
            include_prerelease: overrides.include_prerelease
                || file.include_prerelease.unwrap_or(false),
            connect_timeout: Duration::from_secs(
                file.connect_timeout_secs
                    .unwrap_or(DEFAULT_CONNECT_TIMEOUT_SECS),
            ),
            request_timeout: Duration::from_secs(
                file.request_timeout_secs
                    .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
            ),
            git_timeout: Duration::from_secs(
                file.git_timeout_secs.unwrap_or(DEFAULT_GIT_TIMEOUT_SECS),
            ),
        })
    }

    /// Builds the HTTP client shared by the fetch and download stages.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialized.
    pub fn http_client(&self) -> Result<reqwest::Client> {
        reqwest::Client::builder()
            .connect_timeout(self.connect_timeout)
            .timeout(self.request_timeout)
            .user_agent(concat!("gofetch/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")
    }
}

/// Parses a base URL and makes sure it ends with `/` so `Url::join` appends.
fn parse_base_url(raw: &str) -> Result<Url> {
    let trimmed = raw.trim();
    let with_slash = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{trimmed}/")
    };
    Url::parse(&with_slash).with_context(|| format!("Invalid download URL: {raw}"))
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Location of the config file, honoring `GOFETCH_CONFIG`.
fn config_file_path() -> Option<PathBuf> {
    env_value(CONFIG_ENV)
        .map(PathBuf::from)
        .or_else(|| dirs::config_dir().map(|d| d.join("gofetch").join("config.toml")))
}
