//! Diagnostic logging for gofetch.
//!
//! Logs go to stderr through `tracing-subscriber` so they never mix with the
//! progress and results printed on stdout. The filter comes from the first
//! of:
//!
//! 1. `-v`/`-vv`/`-vvv` (info/debug/trace) or `-q` (error)
//! 2. `GOFETCH_LOG`
//! 3. `RUST_LOG`
//! 4. `warn`

use tracing_subscriber::EnvFilter;

/// Environment variable holding a gofetch-specific log filter.
pub const LOG_ENV: &str = "GOFETCH_LOG";

const DEFAULT_FILTER: &str = "warn";

/// Filter directive implied by the command-line flags, if any.
#[must_use]
pub fn flag_directive(verbose: u8, quiet: bool) -> Option<&'static str> {
    if quiet {
        return Some("error");
    }
    match verbose {
        0 => None,
        1 => Some("info"),
        2 => Some("debug"),
        _ => Some("trace"),
    }
}

/// Builds the filter from flags, then environment, then the default.
fn build_filter(verbose: u8, quiet: bool) -> EnvFilter {
    if let Some(directive) = flag_directive(verbose, quiet) {
        return EnvFilter::new(directive);
    }
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Installs the global subscriber. Later calls are ignored.
pub fn init(verbose: u8, quiet: bool) {
    let result = tracing_subscriber::fmt()
        .with_env_filter(build_filter(verbose, quiet))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();

    if result.is_ok() {
        tracing::debug!(verbose, quiet, "logging initialized");
    }
}
