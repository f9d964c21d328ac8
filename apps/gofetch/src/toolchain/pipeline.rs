//! The resolve → fetch → select → download → verify → install pipeline.
//!
//! Stages run strictly in order and the first failure stops the run. Every
//! error leaves this module as a [`StageError`] naming the stage it came
//! from. The installer never runs on a file whose checksum did not verify,
//! unless the caller explicitly skipped verification.

use std::path::PathBuf;

use super::download::download_file;
use super::index::fetch_release_index;
use super::install::install;
use super::resolver::{GoVersion, resolve_latest};
use super::select::{Asset, GoReleaseNaming, select_asset};
use super::verify::verify_checksum;
use crate::config::Config;
use crate::errors::{GofetchError, InStage, Stage, StageError};

/// What a pipeline run should do.
#[derive(Debug, Clone, Default)]
pub struct PipelineOptions {
    /// Explicit version (`go1.21.0` or `1.21.0`); `None` resolves the latest.
    pub version: Option<String>,
    /// Install the file without comparing its checksum.
    pub skip_verify: bool,
    /// Stop after verification instead of installing.
    pub download_only: bool,
    /// Suppress progress output on stdout.
    pub quiet: bool,
}

/// Result of a successful run.
#[derive(Debug, Clone)]
pub struct Outcome {
    /// The version that was fetched.
    pub version: GoVersion,
    /// The selected release file.
    pub asset: Asset,
    /// Bytes downloaded.
    pub bytes: u64,
    /// Whether the checksum was compared and matched.
    pub verified: bool,
    /// Install directory, if the toolchain was installed.
    pub installed_to: Option<PathBuf>,
}

/// Runs the pipeline with `config`.
///
/// # Errors
///
/// Returns the first failing stage's error. A checksum mismatch is reported
/// from the verify stage and the downloaded file is removed.
pub async fn run(config: &Config, options: &PipelineOptions) -> Result<Outcome, StageError> {
    let version = resolve_version(config, options).await?;
    run_for(config, options, version).await
}

/// The requested version, or the latest one when none was requested.
///
/// # Errors
///
/// Returns a resolve-stage error if the requested version is malformed or
/// the latest one cannot be determined.
pub async fn resolve_version(
    config: &Config,
    options: &PipelineOptions,
) -> Result<GoVersion, StageError> {
    match options.version.as_deref() {
        Some(requested) => GoVersion::parse(requested)
            .ok_or_else(|| GofetchError::no_match(format!("{requested} is not a Go version")))
            .in_stage(Stage::Resolve),
        None => {
            announce(options, "Resolving latest Go version...");
            resolve_latest(config).await.in_stage(Stage::Resolve)
        }
    }
}

/// Runs every stage after resolve for an already-known `version`.
///
/// # Errors
///
/// See [`run`].
pub async fn run_for(
    config: &Config,
    options: &PipelineOptions,
    version: GoVersion,
) -> Result<Outcome, StageError> {
    let say = |message: String| announce(options, &message);

    say(format!("Go version: {version}"));

    let client = config
        .http_client()
        .map_err(|e| GofetchError::network(format!("{e:#}")))
        .in_stage(Stage::Fetch)?;

    say("Fetching release index...".to_string());
    let index = fetch_release_index(&client, config, version.tag())
        .await
        .in_stage(Stage::Fetch)?;
    tracing::debug!(version = %version, files = index.len(), "release index loaded");

    let asset = select_asset(&index, config, &GoReleaseNaming).in_stage(Stage::Select)?;
    tracing::info!(file = %asset.file_name(), checksum = %asset.checksum, "selected release file");

    say(format!("Downloading {}...", asset.url));
    let bytes = download_file(&client, &asset.url, &asset.path, options.quiet)
        .await
        .in_stage(Stage::Download)?;

    let verified = if options.skip_verify {
        tracing::warn!(path = %asset.path.display(), "checksum verification skipped");
        eprintln!(
            "Warning: checksum verification skipped for {}; the file is not verified.",
            asset.file_name()
        );
        false
    } else {
        verify(&asset).in_stage(Stage::Verify)?;
        say(format!("Checksum verified: {}", asset.checksum));
        true
    };

    if options.download_only {
        say(format!("Saved {}", asset.path.display()));
        return Ok(Outcome {
            version,
            asset,
            bytes,
            verified,
            installed_to: None,
        });
    }

    say(format!("Installing into {}...", config.install_dir.display()));
    install(&asset.path, config).await.in_stage(Stage::Install)?;
    say(format!("Go {version} installed successfully."));

    Ok(Outcome {
        version,
        asset,
        bytes,
        verified,
        installed_to: Some(config.install_dir.clone()),
    })
}

fn announce(options: &PipelineOptions, message: &str) {
    if !options.quiet {
        println!("{message}");
    }
}

/// Turns a failed comparison into a mismatch error and drops the file.
fn verify(asset: &Asset) -> Result<(), GofetchError> {
    let check = verify_checksum(&asset.path, &asset.checksum)?;
    if check.verified {
        return Ok(());
    }
    if let Err(e) = std::fs::remove_file(&asset.path) {
        tracing::debug!(error = %e, "could not remove unverified download");
    }
    Err(GofetchError::checksum_mismatch(
        asset.checksum.to_string(),
        check.computed,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FileConfig, Overrides};
    use crate::toolchain::index::Checksum;
    use crate::toolchain::verify::compute_sha256;
    use url::Url;

    fn asset_with(dir: &std::path::Path, content: &[u8], checksum: Checksum) -> Asset {
        let path = dir.join("go1.21.0.linux-amd64.tar.gz");
        std::fs::write(&path, content).unwrap();
        Asset {
            path,
            checksum,
            url: Url::parse("https://golang.org/dl/go1.21.0.linux-amd64.tar.gz").unwrap(),
        }
    }

    #[test]
    fn matching_checksum_keeps_file() {
        let temp = assert_fs::TempDir::new().unwrap();
        let asset = asset_with(temp.path(), b"archive", Checksum::Unknown);
        let digest = compute_sha256(&asset.path).unwrap();
        let asset = Asset {
            checksum: Checksum::Sha256(digest),
            ..asset
        };

        verify(&asset).unwrap();
        assert!(asset.path.exists());
    }

    #[test]
    fn mismatch_reports_both_digests_and_removes_file() {
        let temp = assert_fs::TempDir::new().unwrap();
        let asset = asset_with(temp.path(), b"archive", Checksum::Sha256("abc123".to_string()));

        let err = verify(&asset).unwrap_err();

        match err {
            GofetchError::ChecksumMismatch { expected, actual } => {
                assert_eq!(expected, "abc123");
                assert_eq!(actual, compute_sha256_of(b"archive"));
            }
            other => panic!("expected checksum mismatch, got {other:?}"),
        }
        assert!(!asset.path.exists());
    }

    #[test]
    fn unknown_checksum_is_a_mismatch() {
        let temp = assert_fs::TempDir::new().unwrap();
        let asset = asset_with(temp.path(), b"archive", Checksum::Unknown);

        let err = verify(&asset).unwrap_err();
        assert!(matches!(
            err,
            GofetchError::ChecksumMismatch { ref expected, .. } if expected == "unknown"
        ));
    }

    fn compute_sha256_of(content: &[u8]) -> String {
        let temp = assert_fs::TempDir::new().unwrap();
        let path = temp.path().join("blob");
        std::fs::write(&path, content).unwrap();
        compute_sha256(&path).unwrap()
    }

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[tokio::test]
    async fn invalid_requested_version_fails_in_resolve_stage() {
        let config = Config::from_sources(
            &Overrides::default(),
            &no_env,
            FileConfig::default(),
            PathBuf::from("/tmp"),
        )
        .unwrap();
        let options = PipelineOptions {
            version: Some("latest-and-greatest".to_string()),
            quiet: true,
            ..PipelineOptions::default()
        };

        let err = run(&config, &options).await.unwrap_err();

        assert_eq!(err.stage, Stage::Resolve);
        assert!(matches!(err.source, GofetchError::NoMatch { .. }));
    }
}
