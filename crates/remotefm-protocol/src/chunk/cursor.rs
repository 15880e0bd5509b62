//! Receive-side bookkeeping shared by the disk and buffered receivers.

use super::{Chunk, TransferError};

/// Tracks how many contiguous bytes a transfer has accepted.
#[derive(Debug, Clone)]
pub(crate) struct TransferCursor {
    key: String,
    received: u64,
    declared_total: Option<u64>,
}

impl TransferCursor {
    pub(crate) fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            received: 0,
            declared_total: None,
        }
    }

    pub(crate) fn key(&self) -> &str {
        &self.key
    }

    pub(crate) fn received(&self) -> u64 {
        self.received
    }

    pub(crate) fn declared_total(&self) -> Option<u64> {
        self.declared_total
    }

    /// Check that `chunk` continues the transfer exactly where it left off.
    pub(crate) fn check(&self, chunk: &Chunk) -> Result<(), TransferError> {
        if chunk.offset != self.received {
            return Err(TransferError::OffsetMismatch {
                key: self.key.clone(),
                expected: self.received,
                got: chunk.offset,
            });
        }

        let total = match (self.declared_total, chunk.total_size) {
            (Some(declared), Some(got)) if declared != got => {
                return Err(TransferError::TotalChanged {
                    key: self.key.clone(),
                    declared,
                    got,
                });
            }
            (declared, got) => declared.or(got),
        };

        if let Some(total) = total {
            if chunk.end() > total {
                return Err(TransferError::SizeExceeded {
                    key: self.key.clone(),
                    end: chunk.end(),
                    total,
                });
            }
        }
        Ok(())
    }

    /// Record a chunk that passed [`check`](Self::check) and was stored.
    pub(crate) fn advance(&mut self, chunk: &Chunk) {
        self.received = chunk.end();
        if self.declared_total.is_none() {
            self.declared_total = chunk.total_size;
        }
    }

    /// Called after the terminal chunk: the byte count must match the
    /// declared size, if any was declared.
    pub(crate) fn finish(&self) -> Result<u64, TransferError> {
        match self.declared_total {
            Some(total) if total != self.received => Err(TransferError::SizeMismatch {
                key: self.key.clone(),
                received: self.received,
                total,
            }),
            _ => Ok(self.received),
        }
    }
}
