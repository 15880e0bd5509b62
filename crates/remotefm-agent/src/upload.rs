//! Inbound `upload_file` handling.
//!
//! Each transfer key gets its own worker task fed through a bounded queue,
//! so chunks of one file are written in arrival order while different files
//! are written concurrently.

use std::path::{Path, PathBuf};

use remotefm_protocol::{Chunk, ChunkOutcome, DiskTransfer, Message, TransferError};
use remotefm_session::Outbound;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

/// Chunks that may wait for one worker before the router blocks.
pub const UPLOAD_QUEUE: usize = 16;

/// One `upload_file` payload as it arrived, still base64.
#[derive(Debug, Clone)]
pub struct IncomingChunk {
    pub offset: u64,
    pub data: String,
    pub is_last: bool,
    pub total_size: Option<u64>,
}

/// Worker for one transfer key.
///
/// Waits for `previous` (the worker this one replaces) so two workers never
/// write the same file at once, then drains `chunks` until the router drops
/// the sender. After a failure the remaining chunks are discarded until a
/// new offset-0 chunk restarts the transfer.
pub async fn receive_upload(
    path: PathBuf,
    mut chunks: mpsc::Receiver<IncomingChunk>,
    outbound: Outbound,
    previous: Option<oneshot::Receiver<()>>,
    done: oneshot::Sender<()>,
) {
    if let Some(previous) = previous {
        let _ = previous.await;
    }

    let key = path.display().to_string();
    let mut transfer: Option<DiskTransfer> = None;
    let mut failed = false;

    while let Some(incoming) = chunks.recv().await {
        if incoming.offset == 0 {
            if let Some(abandoned) = transfer.take() {
                info!(path = %key, "Upload restarted from offset 0");
                release(&key, abandoned).await;
            }
            failed = false;
        } else if failed {
            debug!(path = %key, offset = incoming.offset, "Discarding chunk of failed upload");
            continue;
        }

        match write(&path, &mut transfer, incoming).await {
            Ok(ChunkOutcome::Progress { received, total }) => {
                debug!(path = %key, received, total = ?total, "Upload progress");
            }
            Ok(ChunkOutcome::Complete { received }) => {
                info!(path = %key, bytes = received, "File received");
                transfer = None;
            }
            Err(e) => {
                warn!(path = %key, error = %e, "Upload failed");
                if let Some(abandoned) = transfer.take() {
                    release(&key, abandoned).await;
                }
                failed = true;
                let report = Message::error(format!("Failed to receive {key}: {e}"));
                if let Err(e) = outbound.send_message(report).await {
                    debug!(error = %e, "Error report dropped");
                }
            }
        }
    }

    if let Some(abandoned) = transfer.take() {
        release(&key, abandoned).await;
    }
    let _ = done.send(());
}

/// Flush a transfer that will not complete so its bytes are on disk before
/// anyone is told about the failure.
async fn release(key: &str, transfer: DiskTransfer) {
    if let Err(e) = transfer.close().await {
        debug!(path = %key, error = %e, "Flushing abandoned upload failed");
    }
}

async fn write(
    path: &Path,
    slot: &mut Option<DiskTransfer>,
    incoming: IncomingChunk,
) -> Result<ChunkOutcome, TransferError> {
    let chunk = Chunk::from_wire(
        incoming.offset,
        &incoming.data,
        incoming.is_last,
        incoming.total_size,
    )?;
    let transfer = match slot.take() {
        Some(transfer) => transfer,
        None => DiskTransfer::create(path, &chunk).await?,
    };
    slot.insert(transfer).write_chunk(&chunk).await
}
