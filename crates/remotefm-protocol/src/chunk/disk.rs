//! Device-side receiver: writes each chunk straight to its file.

use std::io::SeekFrom;
use std::path::{Path, PathBuf};

use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncSeekExt, AsyncWriteExt};

use super::cursor::TransferCursor;
use super::{Chunk, ChunkOutcome, TransferError};

/// An upload being written to disk at its declared offsets.
#[derive(Debug)]
pub struct DiskTransfer {
    path: PathBuf,
    file: File,
    cursor: TransferCursor,
}

impl DiskTransfer {
    /// Start a transfer into `path` from its first chunk.
    ///
    /// The first chunk must be at offset 0. Missing parent directories are
    /// created and an existing file is truncated.
    pub async fn create(path: &Path, first: &Chunk) -> Result<Self, TransferError> {
        let cursor = TransferCursor::new(path.display().to_string());
        cursor.check(first)?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .await?;

        Ok(Self {
            path: path.to_path_buf(),
            file,
            cursor,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn received(&self) -> u64 {
        self.cursor.received()
    }

    /// Write one chunk at its offset. On the terminal chunk the file is
    /// flushed and synced before the sizes are compared.
    pub async fn write_chunk(&mut self, chunk: &Chunk) -> Result<ChunkOutcome, TransferError> {
        self.cursor.check(chunk)?;

        self.file.seek(SeekFrom::Start(chunk.offset)).await?;
        self.file.write_all(&chunk.data).await?;
        self.cursor.advance(chunk);

        if !chunk.is_last {
            return Ok(ChunkOutcome::Progress {
                received: self.cursor.received(),
                total: self.cursor.declared_total(),
            });
        }

        self.file.flush().await?;
        self.file.sync_all().await?;
        let received = self.cursor.finish()?;
        Ok(ChunkOutcome::Complete { received })
    }

    /// Flush what was written so far and release the file. Used when a
    /// transfer is abandoned before its terminal chunk.
    pub async fn close(mut self) -> Result<(), TransferError> {
        self.file.flush().await?;
        Ok(())
    }
}
