//! Connection Session: one logical WebSocket link to the relay.
//!
//! A session connects, registers (device role), keeps the link alive with
//! pings, hands every inbound envelope to a [`Dispatcher`] in arrival order,
//! and reconnects after a fixed delay whenever the transport drops. It runs
//! until [`SessionHandle::stop`] is called; there is no retry limit.
//!
//! All outbound frames of a link go through one writer task, so envelopes
//! from concurrent handlers never interleave inside a frame.

mod config;
mod error;
mod link;
mod outbound;
mod session;
mod state;
mod transport;


pub use config::SessionConfig;
pub use error::SessionError;
pub use link::{Dispatcher, Link};
pub use outbound::Outbound;
pub use session::SessionHandle;
pub use state::{Role, SessionState};
pub use transport::{BoxTransport, Connector, Transport, WsConnector};

/// A raw WebSocket frame as queued on an [`Outbound`].
pub use tokio_tungstenite::tungstenite::Message as Frame;
