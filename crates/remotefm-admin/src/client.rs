//! Request/reply helpers over an admin session.

use std::path::{Path, PathBuf};
use std::time::Duration;

use remotefm_protocol::{
    ConnectionInfo, Envelope, FileEntry, Message, DEFAULT_CHUNK_SIZE, DEFAULT_PACING,
};
use remotefm_session::{Connector, SessionConfig, SessionHandle, WsConnector};
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::console::{AdminDispatcher, AdminEvent};
use crate::download::SavedFile;
use crate::error::AdminError;
use crate::upload;

/// How an event relates to the reply being waited for.
enum Step<T> {
    Done(T),
    Failed(AdminError),
    /// Not the reply yet, but proof the request is progressing.
    Alive,
    Skip,
}

/// One admin connection to the relay.
///
/// Requests are answered in order of arrival and there are no
/// acknowledgements, so every call waits for the matching reply kind until
/// the response timeout passes without any related event.
pub struct AdminClient {
    session: SessionHandle,
    events: mpsc::UnboundedReceiver<AdminEvent>,
    timeout: Duration,
    chunk_size: usize,
    pacing: Duration,
    connections: Option<Vec<ConnectionInfo>>,
}

impl AdminClient {
    /// Connect to the relay's admin endpoint and wait for the session to
    /// become active. Completed downloads are written into `download_dir`.
    pub async fn connect(
        config: SessionConfig,
        download_dir: PathBuf,
        timeout: Duration,
    ) -> Result<Self, AdminError> {
        Self::connect_with(config, download_dir, timeout, WsConnector).await
    }

    pub async fn connect_with<C: Connector>(
        config: SessionConfig,
        download_dir: PathBuf,
        timeout: Duration,
        connector: C,
    ) -> Result<Self, AdminError> {
        let (events_tx, events) = mpsc::unbounded_channel();
        let dispatcher = AdminDispatcher::new(download_dir, events_tx);
        let session = SessionHandle::start_with(config, dispatcher, connector);
        session.wait_active(timeout).await?;

        Ok(Self {
            session,
            events,
            timeout,
            chunk_size: DEFAULT_CHUNK_SIZE,
            pacing: DEFAULT_PACING,
            connections: None,
        })
    }

    /// Chunk size and pacing for uploads.
    pub fn with_transfer(mut self, chunk_size: usize, pacing: Duration) -> Self {
        self.chunk_size = chunk_size;
        self.pacing = pacing;
        self
    }

    /// The relay's device list. The relay pushes a snapshot when the admin
    /// connects and again on every change.
    pub async fn devices(&mut self) -> Result<Vec<ConnectionInfo>, AdminError> {
        if let Some(connections) = &self.connections {
            return Ok(connections.clone());
        }
        self.wait_for("connections_update", |event| match event {
            AdminEvent::Envelope(Envelope {
                message: Message::ConnectionsUpdate { connections },
                ..
            }) => Step::Done(connections),
            _ => Step::Skip,
        })
        .await
    }

    pub async fn list(&mut self, device: &str, path: &str) -> Result<Vec<FileEntry>, AdminError> {
        self.request(device, Message::ListFiles { path: path.into() })
            .await?;
        self.wait_for("files_list", |event| match event {
            AdminEvent::Envelope(Envelope {
                message: Message::FilesList { path: listed, files },
                ..
            }) if listed == path => Step::Done(files),
            _ => Step::Skip,
        })
        .await
    }

    /// Download a file into the download directory.
    pub async fn download(&mut self, device: &str, path: &str) -> Result<SavedFile, AdminError> {
        self.request(device, Message::DownloadFile { path: path.into() })
            .await?;
        self.wait_for_file(path.to_string()).await
    }

    /// Have the device zip a directory and download the archive.
    pub async fn compress(&mut self, device: &str, path: &str) -> Result<SavedFile, AdminError> {
        self.request(device, Message::Compress { path: path.into() })
            .await?;
        self.wait_for_file(format!("{path}.zip")).await
    }

    /// Upload a local file. Returns the number of bytes sent.
    pub async fn upload(
        &mut self,
        device: &str,
        local: &Path,
        remote: &str,
    ) -> Result<u64, AdminError> {
        let bytes = upload::send_file(
            &self.session,
            device,
            local,
            remote,
            self.chunk_size,
            self.pacing,
        )
        .await?;

        // Uploads are not acknowledged; surface an error that already came back.
        while let Ok(event) = self.events.try_recv() {
            if let Some(message) = remote_error(&event) {
                return Err(AdminError::Remote(message));
            }
        }
        Ok(bytes)
    }

    pub async fn delete(
        &mut self,
        device: &str,
        path: &str,
        recursive: bool,
    ) -> Result<String, AdminError> {
        self.request(
            device,
            Message::Delete {
                path: path.into(),
                recursive,
            },
        )
        .await?;
        self.wait_for("delete_response", |event| match event {
            AdminEvent::Envelope(Envelope {
                message: Message::DeleteResponse { success, message },
                ..
            }) => outcome(success, message),
            _ => Step::Skip,
        })
        .await
    }

    pub async fn create_dir(&mut self, device: &str, path: &str) -> Result<String, AdminError> {
        self.request(device, Message::CreateDir { path: path.into() })
            .await?;
        self.wait_for("create_dir_response", |event| match event {
            AdminEvent::Envelope(Envelope {
                message: Message::CreateDirResponse { success, message },
                ..
            }) => outcome(success, message),
            _ => Step::Skip,
        })
        .await
    }

    pub async fn move_path(
        &mut self,
        device: &str,
        old_path: &str,
        new_path: &str,
    ) -> Result<String, AdminError> {
        self.request(
            device,
            Message::Move {
                old_path: old_path.into(),
                new_path: new_path.into(),
            },
        )
        .await?;
        self.wait_for("move_response", |event| match event {
            AdminEvent::Envelope(Envelope {
                message: Message::MoveResponse { success, message },
                ..
            }) => outcome(success, message),
            _ => Step::Skip,
        })
        .await
    }

    /// The device's `device_info` reply.
    pub async fn device_info(&mut self, device: &str) -> Result<Message, AdminError> {
        self.request(device, Message::GetDeviceInfo {}).await?;
        self.wait_for("device_info", |event| match event {
            AdminEvent::Envelope(Envelope {
                message: message @ Message::DeviceInfo { .. },
                ..
            }) => Step::Done(message),
            _ => Step::Skip,
        })
        .await
    }

    pub async fn close(self) {
        self.session.stop().await;
    }

    async fn request(&self, device: &str, message: Message) -> Result<(), AdminError> {
        self.session
            .send(Envelope::to_device(device, message))
            .await
            .map_err(AdminError::from)
    }

    async fn wait_for_file(&mut self, key: String) -> Result<SavedFile, AdminError> {
        self.wait_for("file_chunk", |event| match event {
            AdminEvent::Saved { file, .. } if file.key == key => Step::Done(file),
            AdminEvent::Progress { key: progress, .. } if progress == key => Step::Alive,
            AdminEvent::TransferFailed { key: failed, error, .. } if failed == key => {
                Step::Failed(error.into())
            }
            _ => Step::Skip,
        })
        .await
    }

    async fn wait_for<T>(
        &mut self,
        what: &'static str,
        mut step: impl FnMut(AdminEvent) -> Step<T>,
    ) -> Result<T, AdminError> {
        let mut deadline = Instant::now() + self.timeout;
        loop {
            let event = match tokio::time::timeout_at(deadline, self.events.recv()).await {
                Ok(Some(event)) => event,
                Ok(None) => return Err(AdminError::Closed),
                Err(_) => return Err(AdminError::Timeout(self.timeout, what)),
            };

            if let Some(message) = remote_error(&event) {
                return Err(AdminError::Remote(message));
            }
            if let AdminEvent::Envelope(Envelope {
                message: Message::ConnectionsUpdate { connections },
                ..
            }) = &event
            {
                self.connections = Some(connections.clone());
            }

            match step(event) {
                Step::Done(value) => return Ok(value),
                Step::Failed(error) => return Err(error),
                Step::Alive => deadline = Instant::now() + self.timeout,
                Step::Skip => {}
            }
        }
    }
}

fn outcome(success: bool, message: String) -> Step<String> {
    if success {
        Step::Done(message)
    } else {
        Step::Failed(AdminError::Remote(message))
    }
}

fn remote_error(event: &AdminEvent) -> Option<String> {
    match event {
        AdminEvent::Envelope(Envelope {
            message: Message::Error { message },
            ..
        }) => Some(message.clone()),
        _ => None,
    }
}

#[cfg(test)]
mod tests;
