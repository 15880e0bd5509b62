//! The byte-level link under a session.

use async_trait::async_trait;
use futures_util::{Sink, Stream};
use tokio_tungstenite::tungstenite::{Error as WsError, Message as WsMessage};

use crate::error::SessionError;

/// A framed WebSocket connection, client side.
pub trait Transport:
    Stream<Item = Result<WsMessage, WsError>> + Sink<WsMessage, Error = WsError> + Send + Unpin
{
}

impl<T> Transport for T where
    T: Stream<Item = Result<WsMessage, WsError>> + Sink<WsMessage, Error = WsError> + Send + Unpin
{
}

pub type BoxTransport = Box<dyn Transport>;

/// Opens transports. The session calls it once per connect attempt.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    async fn connect(&self, url: &str) -> Result<BoxTransport, SessionError>;
}

/// Connects with `tokio-tungstenite` (plain `ws://` or TLS `wss://`).
#[derive(Debug, Clone, Copy, Default)]
pub struct WsConnector;

#[async_trait]
impl Connector for WsConnector {
    async fn connect(&self, url: &str) -> Result<BoxTransport, SessionError> {
        let (ws, _response) = tokio_tungstenite::connect_async(url)
            .await
            .map_err(|e| SessionError::Connect(e.to_string()))?;
        Ok(Box::new(ws))
    }
}
