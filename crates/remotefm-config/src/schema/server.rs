use serde::{Deserialize, Serialize};

/// Connection settings for the device agent's link to the relay.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// WebSocket URL of the relay's device endpoint.
    pub url: String,
    /// Fixed delay before a reconnect attempt (valid range: 1-3600).
    pub reconnect_delay_secs: u64,
    /// WebSocket ping interval while connected (valid range: 5-3600).
    pub ping_interval_secs: u64,
    /// Upper bound on the WebSocket handshake.
    pub connect_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: "ws://127.0.0.1:8000/ws/device".into(),
            reconnect_delay_secs: 5,
            ping_interval_secs: 30,
            connect_timeout_secs: 15,
        }
    }
}
