//! Operation router: maps each inbound kind to its handler.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use remotefm_protocol::{Envelope, Message};
use remotefm_session::{Dispatcher, Link, Outbound};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use crate::device::DeviceProfile;
use crate::download::{serve_archive, serve_file, TransferSettings};
use crate::fs_ops;
use crate::upload::{receive_upload, IncomingChunk, UPLOAD_QUEUE};

/// Device-side dispatcher.
///
/// Quick filesystem operations run inline, in arrival order. Downloads,
/// compress jobs and upload workers run as tasks on the current link.
pub struct AgentRouter {
    profile: DeviceProfile,
    settings: TransferSettings,
    /// Open upload lanes by transfer key.
    uploads: HashMap<String, mpsc::Sender<IncomingChunk>>,
    /// Completion signal of the latest worker per key.
    finishing: HashMap<String, oneshot::Receiver<()>>,
}

impl AgentRouter {
    pub fn new(profile: DeviceProfile, settings: TransferSettings) -> Self {
        Self {
            profile,
            settings,
            uploads: HashMap::new(),
            finishing: HashMap::new(),
        }
    }

    async fn route_upload(&mut self, path: String, incoming: IncomingChunk, link: &mut Link) {
        let is_last = incoming.is_last;

        let lane = match self.uploads.get(&path) {
            Some(lane) if !lane.is_closed() => lane.clone(),
            _ => {
                let (lane, chunks) = mpsc::channel(UPLOAD_QUEUE);
                let (done_tx, done_rx) = oneshot::channel();
                let previous = self.finishing.insert(path.clone(), done_rx);
                link.spawn(receive_upload(
                    PathBuf::from(&path),
                    chunks,
                    link.outbound().clone(),
                    previous,
                    done_tx,
                ));
                self.uploads.insert(path.clone(), lane.clone());
                lane
            }
        };

        if lane.send(incoming).await.is_err() {
            warn!(path = %path, "Upload worker is gone, chunk dropped");
        }
        if is_last {
            // The worker drains what is queued and exits.
            self.uploads.remove(&path);
        }
    }
}

#[async_trait]
impl Dispatcher for AgentRouter {
    fn registration(&self) -> Option<Envelope> {
        Some(self.profile.registration())
    }

    async fn dispatch(&mut self, envelope: Envelope, link: &mut Link) {
        let outbound = link.outbound().clone();

        match envelope.message {
            Message::ListFiles { path } => {
                let files = fs_ops::list_files(Path::new(&path)).await;
                debug!(path = %path, count = files.len(), "Listed directory");
                reply(&outbound, Message::FilesList { path, files }).await;
            }
            Message::DownloadFile { path } => {
                link.spawn(serve_file(outbound, path, self.settings));
            }
            Message::UploadFile {
                path,
                data,
                offset,
                is_last,
                total_size,
            } => {
                let incoming = IncomingChunk {
                    offset,
                    data,
                    is_last,
                    total_size,
                };
                self.route_upload(path, incoming, link).await;
            }
            Message::Delete { path, recursive } => {
                let result = fs_ops::delete(Path::new(&path), recursive).await;
                let (success, message) = fs_ops::outcome(result, "Deleted successfully", "Failed to delete");
                reply(&outbound, Message::DeleteResponse { success, message }).await;
            }
            Message::CreateDir { path } => {
                let result = fs_ops::create_dir(Path::new(&path)).await;
                let (success, message) =
                    fs_ops::outcome(result, "Directory created", "Failed to create directory");
                reply(&outbound, Message::CreateDirResponse { success, message }).await;
            }
            Message::Move { old_path, new_path } => {
                let result = fs_ops::move_path(Path::new(&old_path), Path::new(&new_path)).await;
                let (success, message) = fs_ops::outcome(result, "Moved successfully", "Failed to move");
                reply(&outbound, Message::MoveResponse { success, message }).await;
            }
            Message::Compress { path } => {
                link.spawn(serve_archive(outbound, path, self.settings));
            }
            Message::GetDeviceInfo {} => {
                reply(&outbound, self.profile.info()).await;
            }
            Message::Registered { device_id } => {
                debug!(device_id = %device_id, "Registration acknowledged");
            }
            Message::Error { message } => {
                warn!(message = %message, "Relay reported an error");
            }
            Message::Unknown { kind } => {
                warn!(kind = %kind, "Dropping message of unknown kind");
            }
            other => {
                warn!(kind = other.kind(), "Dropping message the device does not handle");
            }
        }
    }

    fn link_closed(&mut self) {
        self.uploads.clear();
        self.finishing.clear();
    }
}

async fn reply(outbound: &Outbound, message: Message) {
    let kind = message.kind().to_string();
    if let Err(e) = outbound.send_message(message).await {
        debug!(kind = %kind, error = %e, "Reply dropped");
    }
}
