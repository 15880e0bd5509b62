use remotefm_protocol::EncodeError;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("connect failed: {0}")]
    Connect(String),

    #[error("timed out waiting for {0}")]
    Timeout(&'static str),

    #[error("session is not connected")]
    NotConnected,

    #[error("session link closed")]
    Closed,

    #[error(transparent)]
    Encode(#[from] EncodeError),
}
