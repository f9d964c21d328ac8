//! Command modules for the gofetch CLI.
//!
//! - [`completions`] - Shell completion scripts
//! - [`install`] - Download, verify and install a Go toolchain
//! - [`download`] - Download and verify without installing
//! - [`latest`] - Print the latest Go version
//! - [`versions`] - List every Go release
//! - [`unpack`] - Extract an archive (used by the elevated re-invocation)

pub mod completions;
pub mod download;
pub mod install;
pub mod latest;
pub mod unpack;
pub mod versions;
