//! Device/admin wire protocol for remotefm.
//!
//! - [`envelope`]: the JSON envelope codec shared by agent, admin and relay.
//! - [`chunk`]: splitting files into base64 chunks and reassembling them.
//! - [`types`]: listing and device-directory records carried in envelopes.

pub mod chunk;
pub mod envelope;
pub mod types;

pub use chunk::{
    BufferedTransfer, Chunk, ChunkOutcome, ChunkReader, DiskTransfer, TransferError,
    DEFAULT_CHUNK_SIZE, DEFAULT_PACING,
};
pub use envelope::{decode, encode, DecodeError, EncodeError, Envelope, Message};
pub use types::{ConnectionInfo, DeviceStatus, FileEntry};
