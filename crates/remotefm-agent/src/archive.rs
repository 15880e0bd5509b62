//! Directory → temporary ZIP artifact for `compress`.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use remotefm_common::new_id;
use tracing::{debug, warn};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;

#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("Not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("Failed to zip folder: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to zip folder: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Failed to zip folder: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Failed to zip folder: archive task failed: {0}")]
    Task(String),
}

/// A ZIP file in the system temp directory, removed when dropped.
#[derive(Debug)]
pub struct TempArchive {
    path: PathBuf,
}

impl TempArchive {
    fn reserve() -> Self {
        Self {
            path: std::env::temp_dir().join(format!("remotefm-{}.zip", new_id())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempArchive {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "Removed temporary archive"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.path.display(), error = %e, "Failed to remove temporary archive"),
        }
    }
}

/// Archive the regular files under `dir` into a fresh temporary ZIP.
///
/// Runs on the blocking pool. The archive is removed again if building it
/// fails or if the caller goes away before it is handed back.
pub async fn archive_directory(dir: PathBuf) -> Result<TempArchive, ArchiveError> {
    tokio::task::spawn_blocking(move || {
        let archive = TempArchive::reserve();
        let entries = write_zip(&dir, archive.path())?;
        debug!(dir = %dir.display(), entries, archive = %archive.path().display(), "Archive built");
        Ok::<_, ArchiveError>(archive)
    })
    .await
    .map_err(|e| ArchiveError::Task(e.to_string()))?
}

/// Write every regular file under `dir` into a deflated ZIP at `dest`.
///
/// Entry names are paths relative to `dir` with `/` separators; directories
/// get no entries of their own. Returns the number of files written.
pub fn write_zip(dir: &Path, dest: &Path) -> Result<usize, ArchiveError> {
    if !dir.is_dir() {
        return Err(ArchiveError::NotADirectory(dir.to_path_buf()));
    }

    let mut zip = zip::ZipWriter::new(File::create(dest)?);
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
    let mut count = 0;

    for entry in WalkDir::new(dir).follow_links(false).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(dir) else {
            continue;
        };
        let name = relative
            .components()
            .map(|part| part.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        zip.start_file(name, options)?;
        let mut input = File::open(entry.path())?;
        io::copy(&mut input, &mut zip)?;
        count += 1;
    }

    zip.finish()?;
    Ok(count)
}
