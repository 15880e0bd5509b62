/// Transfer integrity and I/O failures.
///
/// None of these end the session; they are reported to the peer in an
/// `error` envelope and the partial artifact is left where it is.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("{key}: chunk at offset {got}, expected offset {expected}")]
    OffsetMismatch { key: String, expected: u64, got: u64 },

    #[error("{key}: chunk ending at byte {end} exceeds declared size {total}")]
    SizeExceeded { key: String, end: u64, total: u64 },

    #[error("{key}: received {received} bytes but {total} were declared")]
    SizeMismatch {
        key: String,
        received: u64,
        total: u64,
    },

    #[error("{key}: declared size changed from {declared} to {got}")]
    TotalChanged { key: String, declared: u64, got: u64 },

    #[error("invalid base64 chunk data: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("source ended after {read} of {expected} bytes")]
    UnexpectedEof { read: u64, expected: u64 },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
