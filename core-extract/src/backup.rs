//! # Backup Packaging
//!
//! Packs a verified downloads tree into a single timestamped zip archive.
//!
//! ## Overview
//!
//! Packaging runs only after verification passes, so the archive is
//! always a complete snapshot. Everything here is synchronous file IO;
//! the pipeline runs it on a blocking thread.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::info;
use walkdir::WalkDir;
use zip::write::FileOptions;
use zip::CompressionMethod;
use zip::ZipWriter;

use crate::error::{ExtractError, Result};

/// Conventional archive file name for a label at a point in time
pub fn archive_file_name(label: &str, now: DateTime<Utc>) -> String {
    format!("backup_{}_{}.zip", label, now.format("%Y-%m-%d_%H-%M-%S"))
}

/// Pack `source_dir` into a zip archive under `backup_dir`
///
/// Directory entries are preserved so empty folders survive the round
/// trip. Entry names use forward slashes regardless of platform.
///
/// # Errors
///
/// Returns [`ExtractError::Backup`] when the source tree is missing or
/// any file cannot be read or written into the archive.
pub fn pack(
    source_dir: &Path,
    backup_dir: &Path,
    label: &str,
    now: DateTime<Utc>,
) -> Result<PathBuf> {
    if !source_dir.is_dir() {
        return Err(ExtractError::Backup(format!(
            "Source directory missing: {}",
            source_dir.display()
        )));
    }

    std::fs::create_dir_all(backup_dir).map_err(|e| ExtractError::Backup(e.to_string()))?;
    let archive_path = backup_dir.join(archive_file_name(label, now));

    let file = File::create(&archive_path).map_err(|e| ExtractError::Backup(e.to_string()))?;
    let mut writer = ZipWriter::new(file);
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut file_count = 0usize;
    for entry in WalkDir::new(source_dir) {
        let entry = entry.map_err(|e| ExtractError::Backup(e.to_string()))?;
        let path = entry.path();
        if path == source_dir {
            continue;
        }

        let relative = path
            .strip_prefix(source_dir)
            .map_err(|e| ExtractError::Backup(e.to_string()))?;
        let name = zip_entry_name(relative);

        if entry.file_type().is_dir() {
            writer
                .add_directory(name, options)
                .map_err(|e| ExtractError::Backup(e.to_string()))?;
        } else {
            writer
                .start_file(name, options)
                .map_err(|e| ExtractError::Backup(e.to_string()))?;
            let mut source = File::open(path).map_err(|e| ExtractError::Backup(e.to_string()))?;
            io::copy(&mut source, &mut writer).map_err(|e| ExtractError::Backup(e.to_string()))?;
            file_count += 1;
        }
    }

    writer
        .finish()
        .map_err(|e| ExtractError::Backup(e.to_string()))?;

    info!(
        archive = %archive_path.display(),
        files = file_count,
        "Packed backup archive"
    );
    Ok(archive_path)
}

/// Archive entry name for a relative path, always forward-slash separated
fn zip_entry_name(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Read;

    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 7, 14, 10, 30, 5).unwrap()
    }

    #[test]
    fn test_archive_file_name_embeds_label_and_timestamp() {
        assert_eq!(
            archive_file_name("finance", fixed_now()),
            "backup_finance_2023-07-14_10-30-05.zip"
        );
    }

    #[test]
    fn test_pack_creates_readable_archive() {
        let source = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(source.path().join("sub")).unwrap();
        std::fs::write(source.path().join("top.txt"), b"hello").unwrap();
        std::fs::write(source.path().join("sub/deep.txt"), b"world").unwrap();
        let backups = tempfile::tempdir().unwrap();

        let archive_path = pack(source.path(), backups.path(), "finance", fixed_now()).unwrap();

        assert_eq!(
            archive_path.file_name().unwrap().to_str().unwrap(),
            "backup_finance_2023-07-14_10-30-05.zip"
        );

        let mut archive = zip::ZipArchive::new(File::open(&archive_path).unwrap()).unwrap();
        let mut contents = String::new();
        archive
            .by_name("sub/deep.txt")
            .unwrap()
            .read_to_string(&mut contents)
            .unwrap();
        assert_eq!(contents, "world");
    }

    #[test]
    fn test_pack_preserves_empty_directories() {
        let source = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(source.path().join("empty")).unwrap();
        let backups = tempfile::tempdir().unwrap();

        let archive_path = pack(source.path(), backups.path(), "finance", fixed_now()).unwrap();

        let archive = zip::ZipArchive::new(File::open(&archive_path).unwrap()).unwrap();
        let names: Vec<&str> = archive.file_names().collect();
        assert!(names.contains(&"empty/"));
    }

    #[test]
    fn test_pack_missing_source_errors() {
        let backups = tempfile::tempdir().unwrap();

        let result = pack(
            Path::new("/definitely/not/here"),
            backups.path(),
            "finance",
            fixed_now(),
        );

        assert!(matches!(result, Err(ExtractError::Backup(_))));
    }

    #[test]
    fn test_pack_creates_backup_directory() {
        let source = tempfile::tempdir().unwrap();
        std::fs::write(source.path().join("a.txt"), b"x").unwrap();
        let backups = tempfile::tempdir().unwrap();
        let nested = backups.path().join("does/not/exist");

        let archive_path = pack(source.path(), &nested, "finance", fixed_now()).unwrap();

        assert!(archive_path.is_file());
    }
}
