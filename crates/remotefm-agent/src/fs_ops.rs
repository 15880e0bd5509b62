//! Filesystem operations behind `list_files`, `delete`, `create_dir` and
//! `move`.

use std::io;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use remotefm_protocol::FileEntry;
use tracing::{debug, warn};

/// Entries directly inside `path`, sorted by name.
///
/// A missing path, or one that is not a directory, yields an empty list.
/// Entries whose metadata cannot be read are skipped.
pub async fn list_files(path: &Path) -> Vec<FileEntry> {
    let mut dir = match tokio::fs::read_dir(path).await {
        Ok(dir) => dir,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Cannot list directory");
            return Vec::new();
        }
    };

    let mut entries = Vec::new();
    loop {
        let entry = match dir.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Directory listing interrupted");
                break;
            }
        };

        let entry_path = entry.path();
        // Follow symlinks so a link to a directory lists as a directory.
        let metadata = match tokio::fs::metadata(&entry_path).await {
            Ok(metadata) => metadata,
            Err(_) => match entry.metadata().await {
                Ok(metadata) => metadata,
                Err(e) => {
                    debug!(path = %entry_path.display(), error = %e, "Skipping unreadable entry");
                    continue;
                }
            },
        };

        let is_directory = metadata.is_dir();
        entries.push(FileEntry {
            name: entry.file_name().to_string_lossy().into_owned(),
            path: absolute(&entry_path).to_string_lossy().into_owned(),
            is_directory,
            size: if metadata.is_file() { metadata.len() } else { 0 },
            modified_time: metadata
                .modified()
                .ok()
                .and_then(|time| time.duration_since(UNIX_EPOCH).ok())
                .map(|age| age.as_millis() as i64)
                .unwrap_or(0),
        });
    }

    entries.sort_by(|a, b| a.name.cmp(&b.name));
    entries
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Remove a file, an empty directory, or (with `recursive`) a whole tree.
pub async fn delete(path: &Path, recursive: bool) -> io::Result<()> {
    let metadata = tokio::fs::symlink_metadata(path).await?;
    if metadata.is_dir() {
        if recursive {
            tokio::fs::remove_dir_all(path).await
        } else {
            tokio::fs::remove_dir(path).await
        }
    } else {
        tokio::fs::remove_file(path).await
    }
}

/// Create `path` and any missing ancestors. An existing directory is fine.
pub async fn create_dir(path: &Path) -> io::Result<()> {
    tokio::fs::create_dir_all(path).await
}

/// Rename `from` to `to`, creating missing ancestors of `to`.
pub async fn move_path(from: &Path, to: &Path) -> io::Result<()> {
    // Surface a missing source before creating anything at the destination.
    tokio::fs::symlink_metadata(from).await?;
    if let Some(parent) = to.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::rename(from, to).await
}

/// `(success, message)` for a `*_response` envelope.
pub fn outcome(result: io::Result<()>, done: &str, failed: &str) -> (bool, String) {
    match result {
        Ok(()) => (true, done.to_string()),
        Err(e) => (false, format!("{failed}: {e}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn empty_directory_lists_nothing() {
        let dir = tempfile::tempdir().unwrap();
        assert!(list_files(dir.path()).await.is_empty());
    }

    #[tokio::test]
    async fn lists_files_and_directories() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.txt"), b"hello").unwrap();
        std::fs::create_dir(dir.path().join("a-dir")).unwrap();
        std::fs::write(dir.path().join("a-dir").join("inner"), b"x").unwrap();
        std::fs::write(dir.path().join("c.bin"), vec![0u8; 300]).unwrap();

        let entries = list_files(dir.path()).await;
        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["a-dir", "b.txt", "c.bin"]);

        assert!(entries[0].is_directory);
        assert_eq!(entries[0].size, 0);
        assert!(!entries[1].is_directory);
        assert_eq!(entries[1].size, 5);
        assert_eq!(entries[2].size, 300);
        assert!(entries[1].modified_time > 0);
        assert!(Path::new(&entries[1].path).is_absolute());
        assert!(entries[1].path.ends_with("b.txt"));
    }

    #[tokio::test]
    async fn missing_or_file_path_lists_nothing() {
        let dir = tempfile::tempdir().unwrap();
        assert!(list_files(&dir.path().join("missing")).await.is_empty());

        let file = dir.path().join("f");
        std::fs::write(&file, b"x").unwrap();
        assert!(list_files(&file).await.is_empty());
    }

    #[tokio::test]
    async fn non_recursive_delete_refuses_non_empty_directory() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("full");
        std::fs::create_dir_all(target.join("sub")).unwrap();
        std::fs::write(target.join("sub").join("f"), b"x").unwrap();

        assert!(delete(&target, false).await.is_err());
        assert!(target.join("sub").join("f").exists());

        delete(&target, true).await.unwrap();
        assert!(!target.exists());
    }

    #[tokio::test]
    async fn delete_removes_files_and_empty_directories() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("f");
        let empty = dir.path().join("empty");
        std::fs::write(&file, b"x").unwrap();
        std::fs::create_dir(&empty).unwrap();

        delete(&file, false).await.unwrap();
        delete(&empty, false).await.unwrap();
        assert!(!file.exists());
        assert!(!empty.exists());
        assert!(delete(&file, false).await.is_err());
    }

    #[tokio::test]
    async fn create_dir_makes_ancestors_and_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let deep = dir.path().join("a").join("b").join("c");
        create_dir(&deep).await.unwrap();
        assert!(deep.is_dir());
        create_dir(&deep).await.unwrap();
    }

    #[tokio::test]
    async fn move_creates_destination_ancestors() {
        let dir = tempfile::tempdir().unwrap();
        let from = dir.path().join("f.txt");
        let to = dir.path().join("x").join("y").join("g.txt");
        std::fs::write(&from, b"data").unwrap();

        move_path(&from, &to).await.unwrap();
        assert!(!from.exists());
        assert_eq!(std::fs::read(&to).unwrap(), b"data");
    }

    #[tokio::test]
    async fn move_of_missing_source_creates_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let to = dir.path().join("new").join("g.txt");
        assert!(move_path(&dir.path().join("missing"), &to).await.is_err());
        assert!(!dir.path().join("new").exists());
    }

    #[test]
    fn outcome_messages() {
        assert_eq!(
            outcome(Ok(()), "Deleted successfully", "Failed to delete"),
            (true, "Deleted successfully".to_string())
        );
        let err = io::Error::new(io::ErrorKind::NotFound, "gone");
        let (success, message) = outcome(Err(err), "Deleted successfully", "Failed to delete");
        assert!(!success);
        assert_eq!(message, "Failed to delete: gone");
    }
}
