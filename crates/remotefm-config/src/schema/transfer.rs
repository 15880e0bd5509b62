use serde::{Deserialize, Serialize};

/// Chunked transfer tuning shared by the agent and the admin console.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransferConfig {
    /// Bytes per chunk before base64 encoding (valid range: 1 KiB - 4 MiB).
    pub chunk_size: usize,
    /// Pause between consecutive chunk sends, in milliseconds (max 1000).
    pub pacing_ms: u64,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            chunk_size: 64 * 1024,
            pacing_ms: 10,
        }
    }
}
