use std::fmt;

/// Lifecycle of a Connection Session.
///
/// `Idle → Connecting → Open → Registering → Active`; any transport loss
/// returns to `Idle` and a reconnect is scheduled. `Closing` is only seen
/// while an explicit stop tears the link down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Connecting,
    Open,
    Registering,
    Active,
    Closing,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Idle => "idle",
            SessionState::Connecting => "connecting",
            SessionState::Open => "open",
            SessionState::Registering => "registering",
            SessionState::Active => "active",
            SessionState::Closing => "closing",
        };
        f.write_str(name)
    }
}

/// Which side of the relay a session speaks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Device,
    Admin,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Device => f.write_str("device"),
            Role::Admin => f.write_str("admin"),
        }
    }
}
