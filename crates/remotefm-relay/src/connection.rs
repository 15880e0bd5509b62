//! Per-connection handlers for the two relay endpoints.

use std::net::SocketAddr;
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{Sink, SinkExt, StreamExt};
use remotefm_protocol::{decode, encode, ConnectionInfo, Envelope, Message};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::{self, Message as Frame};
use tokio_tungstenite::WebSocketStream;

use crate::directory::{ConnId, Directory, Outbox};

type WsSink = SplitSink<WebSocketStream<TcpStream>, Frame>;
type WsStream = SplitStream<WebSocketStream<TcpStream>>;

const REGISTER_TIMEOUT: Duration = Duration::from_secs(10);
const QUEUE_CAPACITY: usize = 256;

/// Which role a connection plays, chosen by the upgrade request path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Device,
    Admin,
}

impl Endpoint {
    pub fn from_path(path: &str) -> Option<Self> {
        match path.trim_end_matches('/') {
            "/ws/device" => Some(Endpoint::Device),
            "/ws/admin" => Some(Endpoint::Admin),
            _ => None,
        }
    }
}

/// Handle a single WebSocket connection.
pub async fn handle_connection(
    ws: WebSocketStream<TcpStream>,
    addr: SocketAddr,
    endpoint: Endpoint,
    dir: Directory,
) {
    match endpoint {
        Endpoint::Device => handle_device(ws, addr, dir).await,
        Endpoint::Admin => handle_admin(ws, addr, dir).await,
    }
}

struct Registration {
    device_id: String,
    device_name: String,
    platform_version: String,
}

async fn handle_device(ws: WebSocketStream<TcpStream>, addr: SocketAddr, dir: Directory) {
    let (mut sink, mut stream) = ws.split();

    let Some(registration) = read_registration(&mut stream, addr).await else {
        return;
    };
    let device_id = registration.device_id;

    let (tx, mut rx) = mpsc::channel::<String>(QUEUE_CAPACITY);
    let conn = dir.next_conn_id();
    let info = ConnectionInfo {
        id: device_id.clone(),
        device_name: registration.device_name,
        ip: addr.ip().to_string(),
        android_version: registration.platform_version,
        connected_at: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        ..ConnectionInfo::default()
    };
    if dir.register_device(conn, info, tx).await.is_some() {
        tracing::info!(device = %device_id, "Replacing previous device connection");
    }

    tracing::info!(peer = %addr, device = %device_id, "Device registered");

    let registered = Envelope::new(Message::Registered {
        device_id: device_id.clone(),
    });
    if send_envelope(&mut sink, &registered).await.is_err() {
        if dir.device_disconnected(&device_id, conn).await {
            broadcast_connections(&dir).await;
        }
        return;
    }
    broadcast_connections(&dir).await;

    loop {
        tokio::select! {
            queued = rx.recv() => match queued {
                Some(text) => {
                    if sink.send(Frame::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                None => {
                    tracing::info!(peer = %addr, device = %device_id, "Connection superseded");
                    let _ = sink.send(Frame::Close(None)).await;
                    break;
                }
            },

            frame = stream.next() => match frame {
                Some(Ok(Frame::Text(text))) => {
                    if forward_to_admins(&dir, &device_id, &text, &mut rx, &mut sink).await.is_err() {
                        break;
                    }
                }
                Some(Ok(Frame::Ping(data))) => {
                    let _ = sink.send(Frame::Pong(data)).await;
                }
                Some(Ok(Frame::Close(_))) | None => break,
                Some(Err(e)) => {
                    tracing::debug!(peer = %addr, error = %e, "WS error");
                    break;
                }
                _ => {}
            },
        }
    }

    tracing::info!(peer = %addr, device = %device_id, "Device disconnected");

    if dir.device_disconnected(&device_id, conn).await {
        broadcast_connections(&dir).await;
    }
}

/// Read the first frame, which must be `device_register`.
async fn read_registration(stream: &mut WsStream, addr: SocketAddr) -> Option<Registration> {
    let frame = tokio::time::timeout(REGISTER_TIMEOUT, stream.next()).await;

    match frame {
        Ok(Some(Ok(Frame::Text(text)))) => match decode(&text) {
            Ok(Envelope {
                message:
                    Message::DeviceRegister {
                        device_id,
                        device_name,
                        platform_version,
                        ..
                    },
                ..
            }) if !device_id.is_empty() => Some(Registration {
                device_id,
                device_name,
                platform_version,
            }),
            Ok(envelope) => {
                tracing::warn!(peer = %addr, kind = %envelope.kind(), "Expected device_register");
                None
            }
            Err(e) => {
                tracing::warn!(peer = %addr, error = %e, "Invalid registration");
                None
            }
        },
        Ok(Some(Ok(_))) => {
            tracing::warn!(peer = %addr, "Expected text registration");
            None
        }
        Ok(Some(Err(e))) => {
            tracing::warn!(peer = %addr, error = %e, "WS error during registration");
            None
        }
        Ok(None) => {
            tracing::debug!(peer = %addr, "Connection closed before registration");
            None
        }
        Err(_) => {
            tracing::warn!(peer = %addr, "Registration timeout (10s)");
            None
        }
    }
}

async fn forward_to_admins(
    dir: &Directory,
    device_id: &str,
    text: &str,
    own: &mut mpsc::Receiver<String>,
    sink: &mut WsSink,
) -> Result<(), tungstenite::Error> {
    let Some(stamped) = stamp_device_id(text, device_id) else {
        tracing::warn!(device = %device_id, "Dropping malformed device frame");
        return Ok(());
    };
    let targets = dir.reply_targets(device_id).await;
    if targets.is_empty() {
        tracing::debug!(device = %device_id, "No admin connected, dropping frame");
    }
    for admin in targets {
        if !forward(&admin, stamped.clone(), own, sink).await? {
            tracing::debug!(device = %device_id, "Admin channel closed");
        }
    }
    Ok(())
}

/// Queue `text` on a peer's outbox. While the peer's queue is full, frames
/// queued for this connection keep flowing to its socket, so two handlers
/// forwarding to each other cannot block on one another's full queues.
///
/// Returns whether the peer took the frame.
async fn forward<S>(
    peer: &Outbox,
    text: String,
    own: &mut mpsc::Receiver<String>,
    sink: &mut S,
) -> Result<bool, tungstenite::Error>
where
    S: Sink<Frame, Error = tungstenite::Error> + Unpin,
{
    let send = peer.send(text);
    tokio::pin!(send);
    loop {
        tokio::select! {
            sent = &mut send => return Ok(sent.is_ok()),
            Some(queued) = own.recv() => sink.send(Frame::Text(queued.into())).await?,
        }
    }
}

/// Set `device_id` on a device frame, leaving the rest of the payload as is.
fn stamp_device_id(text: &str, device_id: &str) -> Option<String> {
    let mut value: Value = serde_json::from_str(text).ok()?;
    let map = value.as_object_mut()?;
    if !map.get("type").is_some_and(Value::is_string) {
        return None;
    }
    map.insert("device_id".into(), Value::String(device_id.to_string()));
    Some(value.to_string())
}

async fn handle_admin(ws: WebSocketStream<TcpStream>, addr: SocketAddr, dir: Directory) {
    let (mut sink, mut stream) = ws.split();

    let (tx, mut rx) = mpsc::channel::<String>(QUEUE_CAPACITY);
    let conn = dir.next_conn_id();
    dir.add_admin(conn, tx).await;

    tracing::info!(peer = %addr, admin = conn, "Admin connected");

    let snapshot = connections_update(&dir).await;
    let sent = match snapshot {
        Some(text) => sink.send(Frame::Text(text.into())).await.is_ok(),
        None => true,
    };

    if sent {
        loop {
            tokio::select! {
                Some(text) = rx.recv() => {
                    if sink.send(Frame::Text(text.into())).await.is_err() {
                        break;
                    }
                }

                frame = stream.next() => match frame {
                    Some(Ok(Frame::Text(text))) => {
                        if route_from_admin(&dir, conn, &text, &mut rx, &mut sink).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Frame::Ping(data))) => {
                        let _ = sink.send(Frame::Pong(data)).await;
                    }
                    Some(Ok(Frame::Close(_))) | None => break,
                    Some(Err(e)) => {
                        tracing::debug!(peer = %addr, error = %e, "WS error");
                        break;
                    }
                    _ => {}
                },
            }
        }
    }

    tracing::info!(peer = %addr, admin = conn, "Admin disconnected");
    dir.remove_admin(conn).await;
}

/// Forward an admin frame to the device it names. Only errors writing back to
/// the admin are returned.
async fn route_from_admin(
    dir: &Directory,
    admin: ConnId,
    text: &str,
    own: &mut mpsc::Receiver<String>,
    sink: &mut WsSink,
) -> Result<(), tungstenite::Error> {
    let envelope = match decode(text) {
        Ok(envelope) => envelope,
        Err(e) => {
            tracing::warn!(admin, error = %e, "Dropping undecodable admin frame");
            return Ok(());
        }
    };
    let Some(device_id) = envelope.device_id else {
        tracing::warn!(admin, kind = %envelope.message.kind(), "Dropping admin frame without device_id");
        return Ok(());
    };

    if let Some(device) = dir.open_device(admin, &device_id).await {
        if forward(&device, text.to_string(), own, sink).await? {
            return Ok(());
        }
    }

    tracing::debug!(admin, device = %device_id, "Target device not connected");
    let reply = Envelope::new(Message::error(format!("Device {device_id} not connected")));
    send_envelope(sink, &reply).await
}

async fn connections_update(dir: &Directory) -> Option<String> {
    let update = Envelope::new(Message::ConnectionsUpdate {
        connections: dir.snapshot().await,
    });
    match encode(&update) {
        Ok(text) => Some(text),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode connections_update");
            None
        }
    }
}

/// Push the current directory to every admin. A full admin queue skips
/// this update rather than stalling the device handler.
async fn broadcast_connections(dir: &Directory) {
    let Some(text) = connections_update(dir).await else {
        return;
    };
    for admin in dir.admins().await {
        if admin.try_send(text.clone()).is_err() {
            tracing::debug!("Admin queue full or closed, skipping connections_update");
        }
    }
}

async fn send_envelope(sink: &mut WsSink, envelope: &Envelope) -> Result<(), tungstenite::Error> {
    match encode(envelope) {
        Ok(text) => sink.send(Frame::Text(text.into())).await,
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode envelope");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_by_path() {
        assert_eq!(Endpoint::from_path("/ws/device"), Some(Endpoint::Device));
        assert_eq!(Endpoint::from_path("/ws/admin/"), Some(Endpoint::Admin));
        assert_eq!(Endpoint::from_path("/"), None);
        assert_eq!(Endpoint::from_path("/ws/other"), None);
    }

    #[test]
    fn stamping_overwrites_device_id_and_keeps_payload() {
        let stamped = stamp_device_id(
            r#"{"type":"files_list","path":"/a","files":[],"device_id":"spoofed","extra":1}"#,
            "dev-1",
        )
        .unwrap();
        let value: Value = serde_json::from_str(&stamped).unwrap();
        assert_eq!(value["device_id"], "dev-1");
        assert_eq!(value["path"], "/a");
        assert_eq!(value["extra"], 1);
    }

    #[test]
    fn stamping_rejects_frames_without_kind() {
        assert!(stamp_device_id("not json", "d").is_none());
        assert!(stamp_device_id("[1,2]", "d").is_none());
        assert!(stamp_device_id(r#"{"path":"/a"}"#, "d").is_none());
    }
}
