//! HTTP download for gofetch.
//!
//! Streams a release file to disk with a text progress line. When the server
//! declares a `Content-Length`, the body is written in fixed-size chunks and
//! progress is reported as a ratio of that length; otherwise the whole body
//! is read into memory and written at once.
//!
//! Connection failures, timeouts and server errors are retried from scratch
//! with exponential backoff; client errors (4xx) are not. A download can be
//! interrupted with Ctrl-C. On any failure the partially written file is
//! removed.

use std::io::Write;
use std::path::Path;
use std::time::Instant;

use futures_util::StreamExt;
use rand::Rng;
use tokio::io::AsyncWriteExt;
use url::Url;

use crate::errors::GofetchError;

/// Size of each write to the destination file.
pub const CHUNK_SIZE: usize = 4096;

/// Minimum interval between progress updates in milliseconds.
const CLI_PROGRESS_INTERVAL_MS: u128 = 250;

/// Maximum number of download attempts.
const MAX_RETRIES: u32 = 3;

/// Base delay between attempts in milliseconds.
const BASE_RETRY_DELAY_MS: u64 = 1000;

/// A failed attempt and whether another one may succeed.
struct Failure {
    error: GofetchError,
    retryable: bool,
}

impl Failure {
    fn fatal(error: GofetchError) -> Self {
        Self {
            error,
            retryable: false,
        }
    }

    fn transient(error: GofetchError) -> Self {
        Self {
            error,
            retryable: true,
        }
    }
}

/// Progress update emitted while a file is being written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    /// Bytes written so far.
    pub written: u64,
    /// Length declared by the server, if any.
    pub total: Option<u64>,
}

impl Progress {
    /// Fraction of the declared length written, in `0.0..=1.0`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn ratio(self) -> Option<f64> {
        match self.total {
            Some(0) => Some(1.0),
            Some(total) => Some((self.written as f64 / total as f64).min(1.0)),
            None => None,
        }
    }
}

/// Downloads `url` to `dest`, printing progress unless `quiet` is set.
///
/// Returns the number of bytes written.
///
/// # Errors
///
/// Returns an I/O error if `dest` cannot be created or written, a network
/// error on connection failure, non-success status or timeout, and a
/// cancelled error when interrupted with Ctrl-C.
pub async fn download_file(
    client: &reqwest::Client,
    url: &Url,
    dest: &Path,
    quiet: bool,
) -> Result<u64, GofetchError> {
    let start_time = Instant::now();
    let mut last_update: Option<Instant> = None;
    let mut report = |progress: Progress| {
        if quiet {
            return;
        }
        let now = Instant::now();
        let due = last_update
            .is_none_or(|at| now.duration_since(at).as_millis() >= CLI_PROGRESS_INTERVAL_MS);
        let finished = progress.total == Some(progress.written);
        if due || finished {
            print_progress(progress, start_time.elapsed().as_secs_f64());
            last_update = Some(now);
        }
    };

    tracing::info!(url = %url, path = %dest.display(), "downloading");

    let result = tokio::select! {
        result = with_retries(client, url, dest, quiet, &mut report) => result,
        _ = tokio::signal::ctrl_c() => Err(GofetchError::cancelled(format!(
            "download of {url} interrupted"
        ))),
    };

    if !quiet {
        println!();
    }

    match result {
        Ok(bytes) => {
            tracing::info!(bytes, path = %dest.display(), "download complete");
            Ok(bytes)
        }
        Err(e) => {
            if let Err(remove_err) = tokio::fs::remove_file(dest).await {
                tracing::debug!(error = %remove_err, "no partial download to remove");
            }
            Err(e)
        }
    }
}

async fn with_retries(
    client: &reqwest::Client,
    url: &Url,
    dest: &Path,
    quiet: bool,
    on_progress: &mut dyn FnMut(Progress),
) -> Result<u64, GofetchError> {
    let mut attempt = 0;
    loop {
        match download_attempt(client, url, dest, on_progress).await {
            Ok(bytes) => return Ok(bytes),
            Err(failure) if failure.retryable && attempt + 1 < MAX_RETRIES => {
                attempt += 1;
                let delay = calculate_retry_delay(attempt);
                tracing::warn!(
                    error = %failure.error,
                    attempt,
                    delay_ms = delay,
                    "download failed, retrying"
                );
                if !quiet {
                    println!();
                    println!("Retrying download (attempt {}/{MAX_RETRIES})...", attempt + 1);
                }
                tokio::time::sleep(std::time::Duration::from_millis(delay)).await;
            }
            Err(failure) => return Err(failure.error),
        }
    }
}

/// Writes the body of `url` to `dest` once, calling `on_progress` after each
/// chunk.
async fn download_attempt(
    client: &reqwest::Client,
    url: &Url,
    dest: &Path,
    on_progress: &mut dyn FnMut(Progress),
) -> Result<u64, Failure> {
    if let Some(parent) = dest.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent).await.map_err(|e| {
            Failure::fatal(GofetchError::io(
                format!("failed to create directory {}", parent.display()),
                e,
            ))
        })?;
    }

    let mut file = tokio::fs::File::create(dest).await.map_err(|e| {
        Failure::fatal(GofetchError::io(
            format!("failed to create {}", dest.display()),
            e,
        ))
    })?;

    let response = client
        .get(url.clone())
        .send()
        .await
        .map_err(|e| Failure::transient(request_error(url, e)))?;

    let status = response.status();
    if !status.is_success() {
        let error = GofetchError::network(format!("HTTP {status}: {url}"));
        return Err(if status.is_server_error() || status.as_u16() == 429 {
            Failure::transient(error)
        } else {
            Failure::fatal(error)
        });
    }

    let total = response.content_length();
    tracing::debug!(?total, "response headers received");

    let written = if let Some(total) = total {
        let mut stream = response.bytes_stream();
        let mut written: u64 = 0;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| Failure::transient(request_error(url, e)))?;
            for piece in chunk.chunks(CHUNK_SIZE) {
                file.write_all(piece)
                    .await
                    .map_err(|e| Failure::fatal(write_error(dest, e)))?;
                written += piece.len() as u64;
                on_progress(Progress {
                    written,
                    total: Some(total),
                });
            }
        }
        written
    } else {
        let body = response
            .bytes()
            .await
            .map_err(|e| Failure::transient(request_error(url, e)))?;
        file.write_all(&body)
            .await
            .map_err(|e| Failure::fatal(write_error(dest, e)))?;
        let written = body.len() as u64;
        on_progress(Progress {
            written,
            total: None,
        });
        written
    };

    file.flush()
        .await
        .map_err(|e| Failure::fatal(write_error(dest, e)))?;
    file.sync_all()
        .await
        .map_err(|e| Failure::fatal(write_error(dest, e)))?;

    Ok(written)
}

fn request_error(url: &Url, e: reqwest::Error) -> GofetchError {
    let what = if e.is_timeout() {
        format!("request to {url} timed out")
    } else {
        format!("request to {url} failed")
    };
    GofetchError::network_with_source(what, e)
}

fn write_error(dest: &Path, e: std::io::Error) -> GofetchError {
    GofetchError::io(format!("failed to write {}", dest.display()), e)
}

/// Calculates the retry delay with exponential backoff and jitter.
///
/// The delay doubles with each attempt (2s, 4s) with +/- 25% jitter.
fn calculate_retry_delay(attempt: u32) -> u64 {
    let base_delay = BASE_RETRY_DELAY_MS * 2u64.pow(attempt);
    let jitter_range = base_delay / 4;
    let jitter = rand::rng().random_range(0..=jitter_range * 2);
    base_delay - jitter_range + jitter
}

/// Prints a simple text-based progress line.
#[allow(clippy::cast_precision_loss)]
#[allow(clippy::cast_possible_truncation)]
#[allow(clippy::cast_sign_loss)]
fn print_progress(progress: Progress, elapsed_secs: f64) {
    let speed = if elapsed_secs > 0.0 {
        progress.written as f64 / elapsed_secs
    } else {
        0.0
    };
    let speed_str = format_speed(speed);
    let written_str = format_bytes(progress.written);

    match (progress.total, progress.ratio()) {
        (Some(total), Some(ratio)) => {
            let percent = (ratio * 100.0) as u8;
            let total_str = format_bytes(total);
            print!("\r{written_str}/{total_str} ({percent}%) {speed_str}     ");
        }
        _ => print!("\r{written_str} {speed_str}     "),
    }
    let _ = std::io::stdout().flush();
}

/// Formats bytes into a human-readable string (KB, MB, GB).
fn format_bytes(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    const GB: f64 = MB * 1024.0;

    #[allow(clippy::cast_precision_loss)]
    let bytes_f = bytes as f64;

    if bytes_f >= GB {
        format!("{:.2} GB", bytes_f / GB)
    } else if bytes_f >= MB {
        format!("{:.2} MB", bytes_f / MB)
    } else if bytes_f >= KB {
        format!("{:.2} KB", bytes_f / KB)
    } else {
        format!("{bytes} B")
    }
}

/// Formats speed (bytes/sec) into a human-readable string.
fn format_speed(speed: f64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;

    if speed >= MB {
        format!("{:.2} MB/s", speed / MB)
    } else if speed >= KB {
        format!("{:.2} KB/s", speed / KB)
    } else {
        format!("{speed:.0} B/s")
    }
}
