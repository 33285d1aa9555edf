//! Gzip tar archives of a day's backup tree.
//!
//! The archive replaces any earlier one with the same name, and the
//! uncompressed source directory is removed only once the archive has been
//! fully written. A failed run leaves the uncompressed files in place.

use std::fs::File;
use std::path::{Path, PathBuf};

use flate2::write::GzEncoder;
use flate2::Compression;
use tar::Builder;
use tracing::info;
use walkdir::WalkDir;

use crate::utils::errors::{BackupError, Result};

/// Archive path for a backup root and date: `{backup_root}/{date}.tar.gz`.
pub fn archive_path(backup_root: &Path, date: &str) -> PathBuf {
    backup_root.join(format!("{}.tar.gz", date))
}

/// Compress `{backup_root}/{date}` into `{backup_root}/{date}.tar.gz` and
/// remove the uncompressed tree afterwards.
pub async fn make_archive(backup_root: &Path, date: &str) -> Result<PathBuf> {
    let source_dir = backup_root.join(date);
    let archive_file = archive_path(backup_root, date);
    let prefix = date.to_string();

    let task_source = source_dir.clone();
    let task_archive = archive_file.clone();
    tokio::task::spawn_blocking(move || build_archive(&task_source, &task_archive, &prefix))
        .await
        .map_err(|e| BackupError::Archive(format!("archive task failed: {}", e)))??;

    std::fs::remove_dir_all(&source_dir)?;
    info!("Created archive at {}", archive_file.display());

    Ok(archive_file)
}

fn build_archive(source_dir: &Path, archive_file: &Path, prefix: &str) -> Result<()> {
    if archive_file.exists() {
        std::fs::remove_file(archive_file)?;
    }

    let file = File::create(archive_file)?;
    let encoder = GzEncoder::new(file, Compression::default());
    let mut builder = Builder::new(encoder);

    for entry in WalkDir::new(source_dir) {
        let entry = entry.map_err(std::io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let relative = path.strip_prefix(source_dir).map_err(|e| {
            BackupError::Archive(format!("relative path for {}: {}", path.display(), e))
        })?;
        builder.append_path_with_name(path, Path::new(prefix).join(relative))?;
    }

    let encoder = builder.into_inner()?;
    encoder.finish()?;

    Ok(())
}
