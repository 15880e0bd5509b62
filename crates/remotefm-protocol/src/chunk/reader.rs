//! Send side: cut a byte source into paced, bounded chunks.

use std::path::Path;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};

use super::{Chunk, TransferError};

/// Reads a source of known size in fixed segments.
///
/// Yields chunks in strictly increasing offset order. An empty source still
/// yields one (empty, terminal) chunk. Bytes past `total_size` are never
/// read; a source shorter than `total_size` fails with
/// [`TransferError::UnexpectedEof`].
#[derive(Debug)]
pub struct ChunkReader<R> {
    reader: R,
    chunk_size: usize,
    total_size: u64,
    offset: u64,
    pacing: Duration,
    started: bool,
    done: bool,
}

impl<R: AsyncRead + Unpin> ChunkReader<R> {
    pub fn new(reader: R, total_size: u64, chunk_size: usize) -> Self {
        Self {
            reader,
            chunk_size: chunk_size.max(1),
            total_size,
            offset: 0,
            pacing: Duration::ZERO,
            started: false,
            done: false,
        }
    }

    /// Sleep for `pacing` before every chunk after the first.
    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }

    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    /// Read the next chunk, or `None` once the terminal chunk was returned.
    pub async fn next_chunk(&mut self) -> Result<Option<Chunk>, TransferError> {
        if self.done {
            return Ok(None);
        }
        if self.started && !self.pacing.is_zero() {
            tokio::time::sleep(self.pacing).await;
        }
        self.started = true;

        let remaining = self.total_size - self.offset;
        let want = remaining.min(self.chunk_size as u64) as usize;
        let mut data = vec![0u8; want];
        let mut filled = 0;
        while filled < want {
            let read = self.reader.read(&mut data[filled..]).await?;
            if read == 0 {
                self.done = true;
                return Err(TransferError::UnexpectedEof {
                    read: self.offset + filled as u64,
                    expected: self.total_size,
                });
            }
            filled += read;
        }

        let chunk = Chunk {
            offset: self.offset,
            is_last: self.offset + want as u64 >= self.total_size,
            data,
            total_size: Some(self.total_size),
        };
        self.offset = chunk.end();
        self.done = chunk.is_last;
        Ok(Some(chunk))
    }
}

impl ChunkReader<tokio::fs::File> {
    /// Open a regular file for chunked sending; its current length is the
    /// declared total size.
    pub async fn open(path: &Path, chunk_size: usize) -> Result<Self, TransferError> {
        let file = tokio::fs::File::open(path).await?;
        let metadata = file.metadata().await?;
        if metadata.is_dir() {
            return Err(TransferError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("{} is a directory", path.display()),
            )));
        }
        Ok(Self::new(file, metadata.len(), chunk_size))
    }
}
