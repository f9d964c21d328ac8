//! Platform detection for gofetch.
//!
//! Go release files are named after `GOOS-GOARCH` pairs (`linux-amd64`,
//! `darwin-arm64`, `windows-386`). This module maps the host's Rust target
//! identifiers to those names.

use std::fmt;

/// Operating system and CPU architecture in Go's naming scheme.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Platform {
    os: String,
    arch: String,
}

/// How the installer consumes a release file on a given OS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallKind {
    /// A `.tar.gz` archive extracted into the install directory.
    Archive,
    /// A `.msi` package handed to the Windows installer service.
    WindowsInstaller,
    /// No install strategy exists for this OS.
    Unsupported,
}

impl Platform {
    /// Builds a platform from Go-style names.
    ///
    /// The names are normalized, so `Platform::new("macos", "x86_64")` equals
    /// `Platform::new("darwin", "amd64")`.
    #[must_use]
    pub fn new(os: &str, arch: &str) -> Self {
        Self {
            os: normalize_os(os).to_string(),
            arch: normalize_arch(arch).to_string(),
        }
    }

    /// Detects the host platform from compile-time target constants.
    #[must_use]
    pub fn detect() -> Self {
        Self::new(std::env::consts::OS, std::env::consts::ARCH)
    }

    /// Go `GOOS` name (`linux`, `darwin`, `windows`, ...).
    #[must_use]
    pub fn os(&self) -> &str {
        &self.os
    }

    /// Go `GOARCH` name (`amd64`, `arm64`, `386`, ...).
    #[must_use]
    pub fn arch(&self) -> &str {
        &self.arch
    }

    /// The `os-arch` suffix used in release file names.
    #[must_use]
    pub fn suffix(&self) -> String {
        format!("{}-{}", self.os, self.arch)
    }

    /// Install strategy for this platform's OS.
    #[must_use]
    pub fn install_kind(&self) -> InstallKind {
        match self.os.as_str() {
            "windows" => InstallKind::WindowsInstaller,
            "linux" | "darwin" | "freebsd" | "netbsd" | "openbsd" | "dragonfly" | "illumos"
            | "solaris" | "aix" => InstallKind::Archive,
            _ => InstallKind::Unsupported,
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.os, self.arch)
    }
}

fn normalize_os(os: &str) -> &str {
    match os {
        "macos" => "darwin",
        other => other,
    }
}

fn normalize_arch(arch: &str) -> &str {
    match arch {
        "x86_64" => "amd64",
        "x86" | "i386" | "i686" => "386",
        "aarch64" => "arm64",
        "arm" => "armv6l",
        "powerpc64" => "ppc64le",
        "loongarch64" => "loong64",
        other => other,
    }
}
