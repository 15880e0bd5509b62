//! Admin → device file upload.

use std::path::Path;
use std::time::Duration;

use remotefm_protocol::{ChunkReader, Envelope};
use remotefm_session::SessionHandle;
use tracing::{debug, info};

use crate::error::AdminError;

/// Stream the local file `local` to `remote` on `device_id` as
/// `upload_file` envelopes. Returns the number of bytes sent.
///
/// The device does not acknowledge successful uploads; failures come back
/// later as `error` envelopes.
pub async fn send_file(
    session: &SessionHandle,
    device_id: &str,
    local: &Path,
    remote: &str,
    chunk_size: usize,
    pacing: Duration,
) -> Result<u64, AdminError> {
    let mut reader = ChunkReader::open(local, chunk_size)
        .await?
        .with_pacing(pacing);
    let total = reader.total_size();

    while let Some(chunk) = reader.next_chunk().await? {
        debug!(remote = %remote, offset = chunk.offset, len = chunk.data.len(), "Sending chunk");
        session
            .send(Envelope::to_device(device_id, chunk.into_upload(remote)))
            .await?;
    }

    info!(device = %device_id, local = %local.display(), remote = %remote, bytes = total, "Upload sent");
    Ok(total)
}
