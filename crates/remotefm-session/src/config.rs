use std::time::Duration;

use crate::state::Role;

/// Configuration for one Connection Session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// WebSocket URL of the relay endpoint for this role.
    pub url: String,
    pub role: Role,
    /// Fixed delay between a transport loss and the next connect attempt.
    pub reconnect_delay: Duration,
    /// WebSocket ping interval while the transport is up.
    pub ping_interval: Duration,
    /// Upper bound on the WebSocket handshake.
    pub connect_timeout: Duration,
    /// Frames that may wait in the outbound queue before senders block.
    pub outbound_capacity: usize,
}

impl SessionConfig {
    pub fn new(url: impl Into<String>, role: Role) -> Self {
        Self {
            url: url.into(),
            role,
            reconnect_delay: Duration::from_secs(5),
            ping_interval: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(15),
            outbound_capacity: 64,
        }
    }
}
