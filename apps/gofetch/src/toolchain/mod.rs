//! Go toolchain retrieval for the gofetch CLI.
//!
//! Each stage of the install pipeline is its own module; [`pipeline`] runs
//! them in order.
//!
//! ## Module Structure
//!
//! - [`platform`] - OS and architecture in Go naming
//! - [`resolver`] - Latest version from the upstream tag listing
//! - [`index`] - Release index page fetching and parsing
//! - [`select`] - Picking the release file for the platform
//! - [`download`] - HTTP download with progress tracking
//! - [`verify`] - SHA256 checksum verification
//! - [`archive`] - tar.gz extraction
//! - [`privilege`] - One-shot elevation for the install directory
//! - [`installed`] - Version of an existing installation
//! - [`install`] - Per-OS install strategy
//! - [`pipeline`] - The stages wired together

pub mod archive;
pub mod download;
pub mod index;
pub mod install;
pub mod installed;
pub mod pipeline;
pub mod platform;
pub mod privilege;
pub mod resolver;
pub mod select;
pub mod verify;

pub use archive::extract_tar_gz;
pub use platform::Platform;
pub use resolver::GoVersion;
