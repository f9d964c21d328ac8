//! Checksum verification for downloaded release files.
//!
//! The digest is computed incrementally so large archives are never held in
//! memory, then compared with the published value.

use std::io::Read;
use std::path::Path;

use sha2::{Digest, Sha256};

use super::index::Checksum;
use crate::errors::GofetchError;

/// Bytes read per hashing step.
const READ_CHUNK: usize = 65536;

/// Result of hashing a file and comparing it with its published digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verification {
    /// Lowercase hex SHA-256 of the file.
    pub computed: String,
    /// Whether `computed` equals the published digest.
    pub verified: bool,
}

/// Hashes the file at `file_path` and compares it with `expected`.
///
/// Comparison is exact string equality against the lowercase hex digest.
/// [`Checksum::Unknown`] never verifies.
///
/// # Errors
///
/// Returns an I/O error if the file cannot be opened or read.
pub fn verify_checksum(
    file_path: &Path,
    expected: &Checksum,
) -> Result<Verification, GofetchError> {
    let computed = compute_sha256(file_path)?;
    let verified = match expected.as_hex() {
        Some(expected) => {
            let matches = computed == expected;
            tracing::debug!(
                path = %file_path.display(),
                expected,
                %computed,
                matches,
                "checksum compared"
            );
            matches
        }
        None => {
            tracing::warn!(path = %file_path.display(), "no published checksum to verify against");
            false
        }
    };
    Ok(Verification { computed, verified })
}

/// Computes the SHA-256 of a file as a lowercase hex string.
///
/// # Errors
///
/// Returns an I/O error if the file cannot be opened or read.
pub fn compute_sha256(file_path: &Path) -> Result<String, GofetchError> {
    let mut file = std::fs::File::open(file_path).map_err(|e| {
        GofetchError::io(
            format!("failed to open {} for checksum", file_path.display()),
            e,
        )
    })?;

    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; READ_CHUNK];

    loop {
        let bytes_read = file.read(&mut buffer).map_err(|e| {
            GofetchError::io(
                format!("failed to read {} for checksum", file_path.display()),
                e,
            )
        })?;

        if bytes_read == 0 {
            break;
        }

        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hex::encode(hasher.finalize()))
}
