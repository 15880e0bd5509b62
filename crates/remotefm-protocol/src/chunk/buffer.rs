//! Admin-side receiver: keeps chunk records until the transfer completes.

use super::cursor::TransferCursor;
use super::{Chunk, ChunkOutcome, TransferError};

#[derive(Debug)]
struct ChunkRecord {
    offset: u64,
    bytes: Vec<u8>,
}

/// A download assembled in memory.
#[derive(Debug)]
pub struct BufferedTransfer {
    cursor: TransferCursor,
    records: Vec<ChunkRecord>,
}

impl BufferedTransfer {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            cursor: TransferCursor::new(key),
            records: Vec::new(),
        }
    }

    pub fn key(&self) -> &str {
        self.cursor.key()
    }

    pub fn received(&self) -> u64 {
        self.cursor.received()
    }

    pub fn total(&self) -> Option<u64> {
        self.cursor.declared_total()
    }

    /// Buffer one chunk. Out-of-order chunks are rejected, not reordered.
    pub fn push(&mut self, chunk: Chunk) -> Result<ChunkOutcome, TransferError> {
        self.cursor.check(&chunk)?;
        self.cursor.advance(&chunk);
        let is_last = chunk.is_last;
        self.records.push(ChunkRecord {
            offset: chunk.offset,
            bytes: chunk.data,
        });

        if is_last {
            let received = self.cursor.finish()?;
            Ok(ChunkOutcome::Complete { received })
        } else {
            Ok(ChunkOutcome::Progress {
                received: self.cursor.received(),
                total: self.cursor.declared_total(),
            })
        }
    }

    /// Concatenate the buffered chunks in offset order.
    pub fn into_bytes(mut self) -> Vec<u8> {
        self.records.sort_by_key(|record| record.offset);
        let mut bytes = Vec::with_capacity(self.cursor.received() as usize);
        for record in self.records {
            bytes.extend_from_slice(&record.bytes);
        }
        bytes
    }
}
