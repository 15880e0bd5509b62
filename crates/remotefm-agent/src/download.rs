//! Outbound file streaming: `download_file` and `compress`.

use std::path::Path;
use std::time::Duration;

use remotefm_config::TransferConfig;
use remotefm_protocol::{ChunkReader, Message, TransferError, DEFAULT_CHUNK_SIZE, DEFAULT_PACING};
use remotefm_session::{Outbound, SessionError};
use tracing::{debug, info, warn};

use crate::archive::archive_directory;

/// Chunk size and pacing used when streaming files out.
#[derive(Debug, Clone, Copy)]
pub struct TransferSettings {
    pub chunk_size: usize,
    pub pacing: Duration,
}

impl Default for TransferSettings {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            pacing: DEFAULT_PACING,
        }
    }
}

impl From<&TransferConfig> for TransferSettings {
    fn from(config: &TransferConfig) -> Self {
        Self {
            chunk_size: config.chunk_size,
            pacing: Duration::from_millis(config.pacing_ms),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SendError {
    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Not a file: {0}")]
    NotAFile(String),

    #[error("Failed to send file: {0}")]
    Transfer(#[from] TransferError),

    /// The link went away mid-stream; nobody is left to tell.
    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Stream `source` as `file_chunk` envelopes under transfer key `key`.
/// Returns the number of bytes sent.
pub async fn send_file(
    outbound: &Outbound,
    source: &Path,
    key: &str,
    settings: TransferSettings,
) -> Result<u64, SendError> {
    match tokio::fs::metadata(source).await {
        Ok(metadata) if !metadata.is_file() => return Err(SendError::NotAFile(key.to_string())),
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(SendError::NotFound(key.to_string()));
        }
        Err(e) => return Err(TransferError::Io(e).into()),
    }

    let mut reader = ChunkReader::open(source, settings.chunk_size)
        .await?
        .with_pacing(settings.pacing);
    let total = reader.total_size();

    while let Some(chunk) = reader.next_chunk().await? {
        outbound.send_message(chunk.into_file_chunk(key)).await?;
    }
    Ok(total)
}

/// Handler task for `download_file`.
pub async fn serve_file(outbound: Outbound, path: String, settings: TransferSettings) {
    let result = send_file(&outbound, Path::new(&path), &path, settings).await;
    finish(&outbound, &path, result).await;
}

/// Handler task for `compress`: archive the directory, stream the archive
/// under `<path>.zip`, then remove it.
pub async fn serve_archive(outbound: Outbound, path: String, settings: TransferSettings) {
    let archive = match archive_directory(path.clone().into()).await {
        Ok(archive) => archive,
        Err(e) => {
            warn!(path = %path, error = %e, "Compress failed");
            report(&outbound, e.to_string()).await;
            return;
        }
    };

    let key = format!("{path}.zip");
    let result = send_file(&outbound, archive.path(), &key, settings).await;
    drop(archive);
    finish(&outbound, &key, result).await;
}

async fn finish(outbound: &Outbound, key: &str, result: Result<u64, SendError>) {
    match result {
        Ok(bytes) => info!(key = %key, bytes, "File sent"),
        Err(SendError::Session(e)) => debug!(key = %key, error = %e, "Link closed during send"),
        Err(e) => {
            warn!(key = %key, error = %e, "Send failed");
            report(outbound, e.to_string()).await;
        }
    }
}

async fn report(outbound: &Outbound, message: String) {
    if let Err(e) = outbound.send_message(Message::error(message)).await {
        debug!(error = %e, "Error report dropped");
    }
}
