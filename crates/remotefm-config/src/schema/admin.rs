use serde::{Deserialize, Serialize};

/// Settings for the admin console.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    /// WebSocket URL of the relay's admin endpoint.
    pub url: String,
    /// Where completed downloads are written.
    pub download_dir: String,
    /// How long a command waits for the device's reply.
    pub response_timeout_secs: u64,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            url: "ws://127.0.0.1:8000/ws/admin".into(),
            download_dir: ".".into(),
            response_timeout_secs: 30,
        }
    }
}
