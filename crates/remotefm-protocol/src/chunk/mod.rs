//! Chunk transfer engine.
//!
//! A file travels as a sequence of [`Chunk`]s in strictly increasing offset
//! order, each carried base64-encoded in one envelope. Exactly one chunk per
//! transfer has `is_last` set: the one ending at `total_size`.
//!
//! Sending uses [`ChunkReader`]. Receiving uses [`DiskTransfer`] (write
//! straight to disk, device side) or [`BufferedTransfer`] (collect, then
//! concatenate, admin side). Both reject a chunk whose offset is not the
//! next expected write position.

mod buffer;
mod cursor;
mod disk;
mod error;
mod reader;


use std::time::Duration;

use base64::Engine as _;

use crate::envelope::Message;

pub use buffer::BufferedTransfer;
pub use disk::DiskTransfer;
pub use error::TransferError;
pub use reader::ChunkReader;

/// Default segment size in bytes (before base64).
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Default pause between consecutive chunk sends of one transfer.
pub const DEFAULT_PACING: Duration = Duration::from_millis(10);

/// A bounded fragment of a file's bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub offset: u64,
    pub data: Vec<u8>,
    pub is_last: bool,
    /// Declared size of the whole transfer, when the sender provided one.
    pub total_size: Option<u64>,
}

impl Chunk {
    /// Offset one past the last byte of this chunk.
    pub fn end(&self) -> u64 {
        self.offset + self.data.len() as u64
    }

    /// Decode the base64 text of a received chunk.
    pub fn from_wire(
        offset: u64,
        data: &str,
        is_last: bool,
        total_size: Option<u64>,
    ) -> Result<Self, TransferError> {
        let data = base64::engine::general_purpose::STANDARD.decode(data)?;
        Ok(Self {
            offset,
            data,
            is_last,
            total_size,
        })
    }

    pub fn encoded_data(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.data)
    }

    /// Wrap as a device → admin `file_chunk` for transfer key `file_name`.
    pub fn into_file_chunk(self, file_name: &str) -> Message {
        Message::FileChunk {
            file_name: file_name.to_string(),
            offset: self.offset,
            data: self.encoded_data(),
            is_last: self.is_last,
            total_size: self.total_size.unwrap_or(self.end()),
        }
    }

    /// Wrap as an admin → device `upload_file` targeting `path`.
    pub fn into_upload(self, path: &str) -> Message {
        Message::UploadFile {
            path: path.to_string(),
            data: self.encoded_data(),
            offset: self.offset,
            is_last: self.is_last,
            total_size: self.total_size,
        }
    }
}

/// Result of feeding one chunk to a receiver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkOutcome {
    /// More chunks are expected; `received` bytes so far.
    Progress { received: u64, total: Option<u64> },
    /// The terminal chunk was processed and sizes agree.
    Complete { received: u64 },
}
