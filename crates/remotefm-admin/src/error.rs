use std::time::Duration;

use remotefm_protocol::TransferError;
use remotefm_session::SessionError;

use crate::download::DownloadError;

#[derive(Debug, thiserror::Error)]
pub enum AdminError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("no reply within {0:?} while waiting for {1}")]
    Timeout(Duration, &'static str),

    #[error("remote error: {0}")]
    Remote(String),

    #[error(transparent)]
    Transfer(#[from] TransferError),

    #[error(transparent)]
    Download(#[from] DownloadError),

    #[error("admin session ended")]
    Closed,
}
