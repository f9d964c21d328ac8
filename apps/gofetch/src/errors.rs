//! Error types for the gofetch CLI.
//!
//! Every failure the install pipeline can produce is one variant of
//! [`GofetchError`]. A failing pipeline stage wraps its error in a
//! [`StageError`] so the diagnostic names both the stage and the error kind,
//! and the binary maps each kind to a distinct process exit code.

use std::fmt;

use thiserror::Error;

/// Exit code for errors that do not carry a [`GofetchError`].
pub const EXIT_FAILURE: i32 = 1;

/// Consolidated error type for gofetch operations.
#[derive(Debug, Error)]
pub enum GofetchError {
    /// A remote host was unreachable, answered with a bad status, or timed out.
    #[error("network error: {message}")]
    Network {
        /// Description of the failed request.
        message: String,
        /// The underlying transport error.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The release index page did not have the expected structure.
    #[error("parse error: {message}")]
    Parse {
        /// What was missing or malformed.
        message: String,
    },

    /// No version tag or no asset matched.
    #[error("no match: {message}")]
    NoMatch {
        /// What was searched for.
        message: String,
    },

    /// A filesystem read or write failed.
    #[error("I/O error: {message}")]
    Io {
        /// Description of the I/O operation that failed.
        message: String,
        /// The underlying I/O error.
        #[source]
        source: Option<std::io::Error>,
    },

    /// Elevation was refused by the user or the operating system.
    #[error("permission denied: {message}")]
    Permission {
        /// Description of the refused operation.
        message: String,
    },

    /// The computed digest differs from the published one.
    #[error("checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch {
        /// The published checksum.
        expected: String,
        /// The checksum of the downloaded file.
        actual: String,
    },

    /// The host operating system has no install strategy.
    #[error("unsupported platform: {message}")]
    Unsupported {
        /// Which OS or architecture was rejected.
        message: String,
    },

    /// The user interrupted the operation.
    #[error("cancelled: {message}")]
    Cancelled {
        /// What was interrupted.
        message: String,
    },
}

impl GofetchError {
    /// Creates a new `Network` error.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new `Network` error with a source error.
    #[must_use]
    pub fn network_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Network {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates a new `Parse` error.
    #[must_use]
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    /// Creates a new `NoMatch` error.
    #[must_use]
    pub fn no_match(message: impl Into<String>) -> Self {
        Self::NoMatch {
            message: message.into(),
        }
    }

    /// Creates a new `Io` error from an I/O error with context.
    #[must_use]
    pub fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source: Some(source),
        }
    }

    /// Creates a new `Io` error without an underlying I/O error.
    #[must_use]
    pub fn io_message(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new `Permission` error.
    #[must_use]
    pub fn permission(message: impl Into<String>) -> Self {
        Self::Permission {
            message: message.into(),
        }
    }

    /// Creates a new `ChecksumMismatch` error.
    #[must_use]
    pub fn checksum_mismatch(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::ChecksumMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Creates a new `Unsupported` error.
    #[must_use]
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::Unsupported {
            message: message.into(),
        }
    }

    /// Creates a new `Cancelled` error.
    #[must_use]
    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::Cancelled {
            message: message.into(),
        }
    }

    /// Process exit code for this error kind.
    ///
    /// Code 2 is left to clap for usage errors.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Network { .. } => 3,
            Self::Parse { .. } => 4,
            Self::NoMatch { .. } => 5,
            Self::Io { .. } => 6,
            Self::Permission { .. } => 7,
            Self::ChecksumMismatch { .. } => 8,
            Self::Unsupported { .. } => 9,
            Self::Cancelled { .. } => 130,
        }
    }

    /// Maps an exit code of an elevated `gofetch unpack` child back to a kind.
    ///
    /// Unknown codes are reported as I/O errors carrying `context`.
    #[must_use]
    pub fn from_exit_code(code: i32, context: impl Into<String>) -> Self {
        let message = context.into();
        match code {
            3 => Self::network(message),
            4 => Self::parse(message),
            5 => Self::no_match(message),
            7 => Self::permission(message),
            9 => Self::unsupported(message),
            130 => Self::cancelled(message),
            _ => Self::io_message(message),
        }
    }
}

/// Pipeline stage names used in diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Picking the latest version from the tag listing.
    Resolve,
    /// Fetching the release index page.
    Fetch,
    /// Choosing the asset for this platform.
    Select,
    /// Downloading the asset.
    Download,
    /// Verifying the SHA-256 checksum.
    Verify,
    /// Installing the toolchain.
    Install,
}

impl Stage {
    /// Lowercase stage name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Resolve => "resolve",
            Self::Fetch => "fetch",
            Self::Select => "select",
            Self::Download => "download",
            Self::Verify => "verify",
            Self::Install => "install",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An error annotated with the pipeline stage that produced it.
#[derive(Debug, Error)]
#[error("{stage} stage failed: {source}")]
pub struct StageError {
    /// The failing stage.
    pub stage: Stage,
    /// What went wrong.
    #[source]
    pub source: GofetchError,
}

impl StageError {
    /// Exit code of the wrapped error.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        self.source.exit_code()
    }
}

/// Attaches a [`Stage`] to a `Result<_, GofetchError>`.
pub trait InStage<T> {
    /// Wraps the error, if any, in a [`StageError`] for `stage`.
    ///
    /// # Errors
    ///
    /// Returns the wrapped error when `self` is `Err`.
    fn in_stage(self, stage: Stage) -> Result<T, StageError>;
}

impl<T> InStage<T> for Result<T, GofetchError> {
    fn in_stage(self, stage: Stage) -> Result<T, StageError> {
        self.map_err(|source| StageError { stage, source })
    }
}

/// Picks the exit code for an error returned from a command.
#[must_use]
pub fn exit_code_for(err: &anyhow::Error) -> i32 {
    if let Some(stage_err) = err.downcast_ref::<StageError>() {
        return stage_err.exit_code();
    }
    if let Some(err) = err.downcast_ref::<GofetchError>() {
        return err.exit_code();
    }
    EXIT_FAILURE
}

/// Renders an error and its causes on one line.
///
/// Causes whose text is already part of the message (a [`StageError`]
/// embeds its [`GofetchError`]) are not repeated.
#[must_use]
pub fn report(err: &anyhow::Error) -> String {
    let mut message = String::new();
    for cause in err.chain() {
        let text = cause.to_string();
        if message.contains(&text) {
            continue;
        }
        if !message.is_empty() {
            message.push_str(": ");
        }
        message.push_str(&text);
    }
    message
}
