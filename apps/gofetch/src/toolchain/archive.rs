//! Archive extraction for gofetch.
//!
//! Go release tarballs hold a single `go/` tree. Entries are written under the
//! install directory as-is, so `/usr/local` receives `/usr/local/go`.

use std::path::{Component, Path};

use flate2::read::GzDecoder;
use tar::Archive;

use crate::errors::GofetchError;

/// Extracts a tar.gz archive into `dest_dir`, creating it if needed.
///
/// Returns the number of entries written.
///
/// # Errors
///
/// Returns an I/O error if:
/// - The archive cannot be opened or is not a valid tar.gz file
/// - An entry is absolute or contains `..`
/// - An entry would be written through a symlink pointing outside `dest_dir`
/// - Directory or file creation fails
pub fn extract_tar_gz(archive_path: &Path, dest_dir: &Path) -> Result<usize, GofetchError> {
    std::fs::create_dir_all(dest_dir).map_err(|e| {
        GofetchError::io(
            format!("failed to create directory {}", dest_dir.display()),
            e,
        )
    })?;

    let file = std::fs::File::open(archive_path).map_err(|e| {
        GofetchError::io(
            format!("failed to open archive {}", archive_path.display()),
            e,
        )
    })?;
    let mut archive = Archive::new(GzDecoder::new(file));
    let corrupt = |e: std::io::Error| {
        GofetchError::io(
            format!("failed to read archive {}", archive_path.display()),
            e,
        )
    };

    let mut written = 0;
    for entry in archive.entries().map_err(corrupt)? {
        let mut entry = entry.map_err(corrupt)?;
        let entry_path = entry.path().map_err(corrupt)?.into_owned();

        // Reject entries that would land outside dest_dir.
        if entry_path.is_absolute()
            || entry_path
                .components()
                .any(|c| matches!(c, Component::ParentDir | Component::Prefix(_)))
        {
            return Err(GofetchError::io_message(format!(
                "refusing to extract {} outside {}",
                entry_path.display(),
                dest_dir.display()
            )));
        }

        // unpack_in also refuses to write through symlinks that leave dest_dir.
        let unpacked = entry.unpack_in(dest_dir).map_err(|e| {
            GofetchError::io(
                format!(
                    "failed to extract {} into {}",
                    entry_path.display(),
                    dest_dir.display()
                ),
                e,
            )
        })?;
        if !unpacked {
            return Err(GofetchError::io_message(format!(
                "refusing to extract {} outside {}",
                entry_path.display(),
                dest_dir.display()
            )));
        }
        written += 1;
    }

    tracing::debug!(entries = written, dest = %dest_dir.display(), "archive extracted");
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use tar::Builder;

    /// Creates a tar.gz laid out like a Go release.
    fn create_go_tarball(archive_path: &Path) {
        let file = std::fs::File::create(archive_path).unwrap();
        let mut builder = Builder::new(GzEncoder::new(file, Compression::default()));

        let mut header = tar::Header::new_gnu();
        header.set_entry_type(tar::EntryType::Directory);
        header.set_size(0);
        header.set_mode(0o755);
        header.set_cksum();
        builder
            .append_data(&mut header, "go/", std::io::empty())
            .unwrap();

        let mut header = tar::Header::new_gnu();
        header.set_size(7);
        header.set_mode(0o755);
        header.set_cksum();
        builder
            .append_data(&mut header, "go/bin/go", b"#!go\n\n\n".as_slice())
            .unwrap();

        let mut header = tar::Header::new_gnu();
        header.set_size(8);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, "go/VERSION", b"go1.21.0".as_slice())
            .unwrap();

        builder.into_inner().unwrap().finish().unwrap();
    }

    /// Creates a tar.gz whose only entry escapes the destination.
    fn create_escaping_tarball(archive_path: &Path) {
        let file = std::fs::File::create(archive_path).unwrap();
        let mut builder = Builder::new(GzEncoder::new(file, Compression::default()));

        let mut header = tar::Header::new_old();
        let name = b"../escaped";
        header.as_old_mut().name[..name.len()].copy_from_slice(name);
        header.set_size(4);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append(&header, b"evil".as_slice()).unwrap();

        builder.into_inner().unwrap().finish().unwrap();
    }

    #[test]
    fn keeps_go_root_folder() {
        let temp = assert_fs::TempDir::new().unwrap();
        let archive = temp.path().join("go1.21.0.linux-amd64.tar.gz");
        create_go_tarball(&archive);
        let prefix = temp.path().join("prefix");

        let entries = extract_tar_gz(&archive, &prefix).unwrap();

        assert_eq!(entries, 3);
        assert!(prefix.join("go/bin/go").is_file());
        assert_eq!(
            std::fs::read_to_string(prefix.join("go/VERSION")).unwrap(),
            "go1.21.0"
        );
    }

    #[cfg(unix)]
    #[test]
    fn preserves_executable_bit() {
        use std::os::unix::fs::PermissionsExt;

        let temp = assert_fs::TempDir::new().unwrap();
        let archive = temp.path().join("go.tar.gz");
        create_go_tarball(&archive);

        extract_tar_gz(&archive, temp.path()).unwrap();

        let mode = std::fs::metadata(temp.path().join("go/bin/go"))
            .unwrap()
            .permissions()
            .mode();
        assert_ne!(mode & 0o111, 0);
    }

    #[test]
    fn overwrites_existing_files() {
        let temp = assert_fs::TempDir::new().unwrap();
        let archive = temp.path().join("go.tar.gz");
        create_go_tarball(&archive);
        let prefix = temp.path().join("prefix");
        std::fs::create_dir_all(prefix.join("go")).unwrap();
        std::fs::write(prefix.join("go/VERSION"), "go1.20.0").unwrap();

        extract_tar_gz(&archive, &prefix).unwrap();

        assert_eq!(
            std::fs::read_to_string(prefix.join("go/VERSION")).unwrap(),
            "go1.21.0"
        );
    }

    #[test]
    fn rejects_parent_directory_entries() {
        let temp = assert_fs::TempDir::new().unwrap();
        let archive = temp.path().join("evil.tar.gz");
        create_escaping_tarball(&archive);
        let prefix = temp.path().join("prefix");

        let err = extract_tar_gz(&archive, &prefix).unwrap_err();

        assert!(matches!(err, GofetchError::Io { .. }));
        assert!(!temp.path().join("escaped").exists());
    }

    #[cfg(unix)]
    #[test]
    fn refuses_to_write_through_escaping_symlink() {
        let temp = assert_fs::TempDir::new().unwrap();
        let outside = temp.path().join("outside");
        std::fs::create_dir(&outside).unwrap();
        let archive = temp.path().join("go.tar.gz");

        let file = std::fs::File::create(&archive).unwrap();
        let mut builder = Builder::new(GzEncoder::new(file, Compression::default()));
        let mut header = tar::Header::new_gnu();
        header.set_entry_type(tar::EntryType::Symlink);
        header.set_size(0);
        header.set_mode(0o777);
        builder
            .append_link(&mut header, "go/escape", &outside)
            .unwrap();
        let mut header = tar::Header::new_gnu();
        header.set_size(4);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, "go/escape/owned", b"evil".as_slice())
            .unwrap();
        builder.into_inner().unwrap().finish().unwrap();

        let err = extract_tar_gz(&archive, &temp.path().join("prefix")).unwrap_err();

        assert!(matches!(err, GofetchError::Io { .. }));
        assert!(!outside.join("owned").exists());
    }

    #[test]
    fn corrupt_archive_is_io_error() {
        let temp = assert_fs::TempDir::new().unwrap();
        let archive = temp.path().join("broken.tar.gz");
        std::fs::write(&archive, b"this is not gzip").unwrap();

        let err = extract_tar_gz(&archive, &temp.path().join("out")).unwrap_err();
        assert!(matches!(err, GofetchError::Io { .. }));
    }
}
