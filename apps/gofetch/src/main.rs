#![warn(clippy::pedantic)]

//! # gofetch
//!
//! Installs the latest Go toolchain. The `gofetch install` pipeline:
//!
//! 1. Resolves the newest `go*` tag with `git ls-remote --tags`
//! 2. Reads the file table for that version from the release page
//! 3. Picks the file built for this OS and architecture
//! 4. Downloads it with a progress line
//! 5. Compares its SHA-256 with the published checksum
//! 6. Extracts it into `/usr/local` (elevating with sudo if needed), or runs
//!    the `.msi` installer on Windows
//!
//! ## Examples
//!
//! ```bash
//! gofetch install
//! gofetch install --version 1.21.0 --prefix "$HOME/.local"
//! gofetch download --os darwin --arch arm64 --dest /tmp
//! gofetch latest
//! gofetch versions --json
//! gofetch completions bash
//! ```

mod commands;
mod config;
mod errors;
mod logging;
mod toolchain;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use commands::{completions, download, install, latest, unpack, versions};

/// Download, verify and install the latest Go toolchain.
#[derive(Parser)]
#[command(
    name = "gofetch",
    author,
    version,
    long_version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("GOFETCH_GIT_COMMIT"), ")"),
    about = "Download, verify and install the latest Go toolchain",
    after_help = "\
ENVIRONMENT VARIABLES:
    GOFETCH_REPO_URL    Git repository listing release tags (default: https://github.com/golang/go)
    GOFETCH_DL_URL      Base URL of release files (default: https://golang.org/dl/)
    GOFETCH_INDEX_URL   Release index page (default: GOFETCH_DL_URL)
    GOFETCH_PREFIX      Install directory (default: /usr/local)
    GOFETCH_OS          Override the detected operating system
    GOFETCH_ARCH        Override the detected architecture
    GOFETCH_CONFIG      Config file (default: <config dir>/gofetch/config.toml)
    GOFETCH_LOG         Log filter, e.g. \"debug\" (falls back to RUST_LOG)

EXIT CODES:
    3 network, 4 parse, 5 no match, 6 I/O, 7 permission,
    8 checksum mismatch, 9 unsupported platform, 130 cancelled"
)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[clap(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Only print errors and results.
    #[clap(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands for the gofetch CLI.
#[derive(Subcommand)]
pub enum Commands {
    /// Download, verify and install a Go toolchain.
    ///
    /// Without --version the latest stable release is installed.
    Install(install::InstallArgs),

    /// Download and verify a release file without installing it.
    Download(download::DownloadArgs),

    /// Print the latest Go version.
    Latest(latest::LatestArgs),

    /// List available Go versions, newest first.
    Versions(versions::VersionsArgs),

    /// Generate shell completions.
    Completions(completions::CompletionsArgs),

    /// Extract a release archive into a directory.
    #[command(hide = true)]
    Unpack(unpack::UnpackArgs),
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.quiet);

    if let Err(e) = run(cli).await {
        let exit_code = handle_error(&e);
        std::process::exit(exit_code);
    }
}

/// Prints an error and returns the exit code for its kind.
fn handle_error(e: &anyhow::Error) -> i32 {
    eprintln!("Error: {}", errors::report(e));
    errors::exit_code_for(e)
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Install(args) => install::execute(&args, cli.quiet).await,
        Commands::Download(args) => download::execute(&args, cli.quiet).await,
        Commands::Latest(args) => latest::execute(&args).await,
        Commands::Versions(args) => versions::execute(&args).await,
        Commands::Completions(args) => completions::execute(&args),
        Commands::Unpack(args) => unpack::execute(&args),
    }
}
