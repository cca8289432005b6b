//! Folder-tree archiving into gzip-compressed tar files.
//!
//! Archive creation is blocking I/O; async callers run it under
//! `tokio::task::spawn_blocking`. On any error the partially written
//! destination file is removed, so a failed call never leaves an artifact
//! that could be mistaken for a complete archive.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use flate2::write::GzEncoder;
use flate2::Compression;
use thiserror::Error;

/// Archive creation errors
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("source folder {0:?} is not a directory")]
    NotADirectory(PathBuf),

    #[error("failed to read source folder {path:?}: {source}")]
    Source {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write archive: {0}")]
    Io(#[from] io::Error),
}

/// Archive file name for a backup series: `<prefix>-<YYYYMMDD>-<HHMMSS>.tar.gz`.
///
/// Second precision; two archives generated within the same second collide.
pub fn archive_file_name(prefix: &str, timestamp: DateTime<Local>) -> String {
    format!("{prefix}-{}.tar.gz", timestamp.format("%Y%m%d-%H%M%S"))
}

/// Archive every folder in `folders` into a gzip-compressed tar at `dest`.
///
/// Each folder is walked recursively; entry paths are the folder's own path
/// with any leading `/` stripped, so relative structure inside each folder is
/// preserved.
pub fn create_archive(folders: &[PathBuf], dest: &Path) -> Result<(), ArchiveError> {
    let result = write_archive(folders, dest);
    if result.is_err() {
        // Never leave a partial archive behind.
        let _ = fs::remove_file(dest);
    }
    result
}

fn write_archive(folders: &[PathBuf], dest: &Path) -> Result<(), ArchiveError> {
    let file = File::create(dest)?;
    let encoder = GzEncoder::new(file, Compression::default());
    let mut archive = tar::Builder::new(encoder);

    for folder in folders {
        let metadata = fs::metadata(folder).map_err(|source| ArchiveError::Source {
            path: folder.clone(),
            source,
        })?;
        if !metadata.is_dir() {
            return Err(ArchiveError::NotADirectory(folder.clone()));
        }

        archive
            .append_dir_all(entry_root(folder), folder)
            .map_err(|source| ArchiveError::Source {
                path: folder.clone(),
                source,
            })?;
    }

    let encoder = archive.into_inner()?;
    encoder.finish()?;
    Ok(())
}

fn entry_root(folder: &Path) -> &Path {
    folder.strip_prefix("/").unwrap_or(folder)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Read;

    use chrono::TimeZone;
    use flate2::read::GzDecoder;

    use super::*;

    fn read_entries(path: &Path) -> HashMap<String, String> {
        let file = File::open(path).unwrap();
        let mut archive = tar::Archive::new(GzDecoder::new(file));

        let mut entries = HashMap::new();
        for entry in archive.entries().unwrap() {
            let mut entry = entry.unwrap();
            let name = entry.path().unwrap().to_string_lossy().into_owned();
            let mut contents = String::new();
            entry.read_to_string(&mut contents).unwrap();
            entries.insert(name, contents);
        }
        entries
    }

    #[test]
    fn file_name_has_second_precision() {
        let timestamp = Local.with_ymd_and_hms(2024, 1, 4, 3, 5, 9).unwrap();
        assert_eq!(
            archive_file_name("nightly", timestamp),
            "nightly-20240104-030509.tar.gz"
        );
    }

    #[test]
    fn archives_folder_trees_preserving_relative_paths() {
        let source = tempfile::tempdir().unwrap();
        fs::write(source.path().join("a.txt"), "alpha").unwrap();
        fs::create_dir(source.path().join("sub")).unwrap();
        fs::write(source.path().join("sub/b.txt"), "beta").unwrap();

        let staging = tempfile::tempdir().unwrap();
        let dest = staging.path().join("out.tar.gz");
        create_archive(&[source.path().to_path_buf()], &dest).unwrap();

        let root = entry_root(source.path()).to_string_lossy().into_owned();
        let entries = read_entries(&dest);
        assert_eq!(entries.get(&format!("{root}/a.txt")).unwrap(), "alpha");
        assert_eq!(entries.get(&format!("{root}/sub/b.txt")).unwrap(), "beta");
    }

    #[test]
    fn archives_multiple_folders() {
        let first = tempfile::tempdir().unwrap();
        fs::write(first.path().join("one.txt"), "1").unwrap();
        let second = tempfile::tempdir().unwrap();
        fs::write(second.path().join("two.txt"), "2").unwrap();

        let staging = tempfile::tempdir().unwrap();
        let dest = staging.path().join("out.tar.gz");
        create_archive(
            &[first.path().to_path_buf(), second.path().to_path_buf()],
            &dest,
        )
        .unwrap();

        let entries = read_entries(&dest);
        let first_root = entry_root(first.path()).to_string_lossy().into_owned();
        let second_root = entry_root(second.path()).to_string_lossy().into_owned();
        assert!(entries.contains_key(&format!("{first_root}/one.txt")));
        assert!(entries.contains_key(&format!("{second_root}/two.txt")));
    }

    #[test]
    fn missing_folder_fails_and_removes_partial_file() {
        let staging = tempfile::tempdir().unwrap();
        let dest = staging.path().join("out.tar.gz");

        let error = create_archive(&[PathBuf::from("/does/not/exist")], &dest).unwrap_err();
        assert!(matches!(error, ArchiveError::Source { .. }));
        assert!(!dest.exists());
    }

    #[test]
    fn file_as_source_is_rejected() {
        let source = tempfile::tempdir().unwrap();
        let file_path = source.path().join("plain.txt");
        fs::write(&file_path, "not a folder").unwrap();

        let staging = tempfile::tempdir().unwrap();
        let dest = staging.path().join("out.tar.gz");

        let error = create_archive(&[file_path], &dest).unwrap_err();
        assert!(matches!(error, ArchiveError::NotADirectory(_)));
        assert!(!dest.exists());
    }
}
