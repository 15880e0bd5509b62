//! Admin-side dispatcher: turns inbound envelopes into [`AdminEvent`]s.

use std::path::PathBuf;

use async_trait::async_trait;
use remotefm_protocol::{Envelope, Message};
use remotefm_session::{Dispatcher, Link};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::download::{Accepted, DownloadAssembler, DownloadError, SavedFile};

/// Something the admin console should react to.
#[derive(Debug)]
pub enum AdminEvent {
    /// Any reply other than a file chunk, as received.
    Envelope(Envelope),
    Progress {
        device_id: Option<String>,
        key: String,
        received: u64,
        total: Option<u64>,
    },
    Saved {
        device_id: Option<String>,
        file: SavedFile,
    },
    TransferFailed {
        device_id: Option<String>,
        key: String,
        error: DownloadError,
    },
}

pub struct AdminDispatcher {
    assembler: DownloadAssembler,
    events: mpsc::UnboundedSender<AdminEvent>,
}

impl AdminDispatcher {
    pub fn new(download_dir: impl Into<PathBuf>, events: mpsc::UnboundedSender<AdminEvent>) -> Self {
        Self {
            assembler: DownloadAssembler::new(download_dir),
            events,
        }
    }

    fn emit(&self, event: AdminEvent) {
        if self.events.send(event).is_err() {
            debug!("Admin event dropped, no listener");
        }
    }
}

#[async_trait]
impl Dispatcher for AdminDispatcher {
    fn registration(&self) -> Option<Envelope> {
        None
    }

    async fn dispatch(&mut self, envelope: Envelope, _link: &mut Link) {
        let Envelope { device_id, message } = envelope;
        match message {
            Message::FileChunk {
                file_name,
                offset,
                data,
                is_last,
                total_size,
            } => {
                let accepted = self
                    .assembler
                    .accept(
                        device_id.as_deref().unwrap_or_default(),
                        &file_name,
                        offset,
                        &data,
                        is_last,
                        total_size,
                    )
                    .await;
                match accepted {
                    Ok(Accepted::Progress { received, total }) => self.emit(AdminEvent::Progress {
                        device_id,
                        key: file_name,
                        received,
                        total,
                    }),
                    Ok(Accepted::Saved(file)) => self.emit(AdminEvent::Saved { device_id, file }),
                    Ok(Accepted::Ignored) => {}
                    Err(error) => {
                        warn!(key = %file_name, error = %error, "Download failed");
                        self.emit(AdminEvent::TransferFailed {
                            device_id,
                            key: file_name,
                            error,
                        });
                    }
                }
            }
            Message::Unknown { kind } => {
                warn!(kind = %kind, "Dropping message of unknown kind");
            }
            message => self.emit(AdminEvent::Envelope(Envelope { device_id, message })),
        }
    }

    fn link_closed(&mut self) {
        self.assembler.clear();
    }
}
