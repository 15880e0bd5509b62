//! Accept loop and offline-record reaper.

use std::time::Duration;

use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::accept_hdr_async;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::StatusCode;

use crate::connection::{handle_connection, Endpoint};
use crate::directory::Directory;

const REAP_INTERVAL: Duration = Duration::from_secs(60);

/// Accept connections forever, one task per connection.
pub async fn serve(listener: TcpListener, dir: Directory) {
    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let dir = dir.clone();
                tokio::spawn(async move {
                    match upgrade(stream).await {
                        Ok((ws, endpoint)) => handle_connection(ws, addr, endpoint, dir).await,
                        Err(e) => {
                            tracing::warn!(peer = %addr, error = %e, "WS handshake failed");
                        }
                    }
                });
            }
            Err(e) => {
                tracing::warn!(error = %e, "TCP accept error");
            }
        }
    }
}

/// Complete the WebSocket handshake, refusing paths that are not an endpoint.
async fn upgrade(
    stream: TcpStream,
) -> Result<
    (tokio_tungstenite::WebSocketStream<TcpStream>, Endpoint),
    tokio_tungstenite::tungstenite::Error,
> {
    let mut endpoint = None;
    let callback = |request: &Request, response: Response| -> Result<Response, ErrorResponse> {
        match Endpoint::from_path(request.uri().path()) {
            Some(found) => {
                endpoint = Some(found);
                Ok(response)
            }
            None => {
                let mut refusal = ErrorResponse::new(Some("unknown endpoint".into()));
                *refusal.status_mut() = StatusCode::NOT_FOUND;
                Err(refusal)
            }
        }
    };
    let ws = accept_hdr_async(stream, callback).await?;
    // The callback only returns Ok after recording the endpoint.
    match endpoint {
        Some(endpoint) => Ok((ws, endpoint)),
        None => Err(tokio_tungstenite::tungstenite::Error::ConnectionClosed),
    }
}

/// Periodically drop devices that have been offline longer than `ttl`.
pub async fn reap_forever(dir: Directory, ttl: Duration) {
    loop {
        tokio::time::sleep(REAP_INTERVAL).await;
        let reaped = dir.reap_offline(ttl).await;
        let (online, known, admins) = dir.counts().await;
        tracing::debug!(reaped, online, known, admins, "Reaper tick");
    }
}
