//! Client tests against a scripted relay on a loopback socket.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use remotefm_protocol::{decode, encode, Chunk, ConnectionInfo, DeviceStatus, Envelope, Message};
use remotefm_session::{Role, SessionConfig};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::WebSocketStream;

use super::AdminClient;
use crate::error::AdminError;

type Relay = WebSocketStream<TcpStream>;

async fn fake_relay() -> (String, JoinHandle<Relay>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}/ws/admin", listener.local_addr().unwrap());
    let accept = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        tokio_tungstenite::accept_async(stream).await.unwrap()
    });
    (url, accept)
}

async fn connect(timeout: Duration) -> (AdminClient, Relay, tempfile::TempDir) {
    let (url, accept) = fake_relay().await;
    let downloads = tempfile::tempdir().unwrap();
    let client = AdminClient::connect(
        SessionConfig::new(url, Role::Admin),
        downloads.path().to_path_buf(),
        timeout,
    )
    .await
    .unwrap()
    .with_transfer(16, Duration::ZERO);
    let relay = accept.await.unwrap();
    (client, relay, downloads)
}

async fn send(relay: &mut Relay, envelope: Envelope) {
    relay
        .send(WsMessage::Text(encode(&envelope).unwrap().into()))
        .await
        .unwrap();
}

async fn receive(relay: &mut Relay) -> Envelope {
    loop {
        match relay.next().await.unwrap().unwrap() {
            WsMessage::Text(text) => return decode(&text).unwrap(),
            _ => continue,
        }
    }
}

#[tokio::test]
async fn devices_come_from_the_connect_snapshot() {
    let (mut client, mut relay, _dir) = connect(Duration::from_secs(5)).await;
    let device = ConnectionInfo {
        id: "dev-1".into(),
        device_name: "Pixel".into(),
        ip: "10.0.0.5".into(),
        android_version: "14".into(),
        connected_at: "2026-10-18 10:00:00".into(),
        status: DeviceStatus::Online,
    };
    send(
        &mut relay,
        Envelope::new(Message::ConnectionsUpdate {
            connections: vec![device.clone()],
        }),
    )
    .await;

    assert_eq!(client.devices().await.unwrap(), vec![device]);
    client.close().await;
}

#[tokio::test]
async fn list_is_addressed_to_the_device() {
    let (mut client, mut relay, _dir) = connect(Duration::from_secs(5)).await;

    let relay_task = tokio::spawn(async move {
        let request = receive(&mut relay).await;
        assert_eq!(request.device_id.as_deref(), Some("dev-1"));
        assert_eq!(
            request.message,
            Message::ListFiles {
                path: "/sdcard".into()
            }
        );
        send(
            &mut relay,
            Envelope::to_device(
                "dev-1",
                Message::FilesList {
                    path: "/sdcard".into(),
                    files: vec![],
                },
            ),
        )
        .await;
        relay
    });

    assert!(client.list("dev-1", "/sdcard").await.unwrap().is_empty());
    let _relay = relay_task.await.unwrap();
    client.close().await;
}

#[tokio::test]
async fn download_is_saved_to_the_download_dir() {
    let (mut client, mut relay, dir) = connect(Duration::from_secs(5)).await;
    let content = b"remote file contents".to_vec();
    let served = content.clone();

    let relay_task = tokio::spawn(async move {
        let request = receive(&mut relay).await;
        assert_eq!(request.kind(), "download_file");
        for (offset, part) in served.chunks(8).enumerate() {
            let chunk = Chunk {
                offset: (offset * 8) as u64,
                data: part.to_vec(),
                is_last: offset * 8 + part.len() == served.len(),
                total_size: Some(served.len() as u64),
            };
            send(
                &mut relay,
                Envelope::to_device("dev-1", chunk.into_file_chunk("/sdcard/notes.txt")),
            )
            .await;
        }
        relay
    });

    let saved = client.download("dev-1", "/sdcard/notes.txt").await.unwrap();
    assert_eq!(saved.path, dir.path().join("notes.txt"));
    assert_eq!(std::fs::read(&saved.path).unwrap(), content);
    let _relay = relay_task.await.unwrap();
    client.close().await;
}

#[tokio::test]
async fn failed_response_is_a_remote_error() {
    let (mut client, mut relay, _dir) = connect(Duration::from_secs(5)).await;

    let relay_task = tokio::spawn(async move {
        receive(&mut relay).await;
        send(
            &mut relay,
            Envelope::to_device(
                "dev-1",
                Message::DeleteResponse {
                    success: false,
                    message: "Failed to delete: Directory not empty".into(),
                },
            ),
        )
        .await;
        relay
    });

    let err = client.delete("dev-1", "/sdcard/full", false).await.unwrap_err();
    assert!(matches!(err, AdminError::Remote(ref m) if m.starts_with("Failed to delete")));
    let _relay = relay_task.await.unwrap();
    client.close().await;
}

#[tokio::test]
async fn relay_error_ends_the_wait() {
    let (mut client, mut relay, _dir) = connect(Duration::from_secs(5)).await;

    let relay_task = tokio::spawn(async move {
        receive(&mut relay).await;
        send(&mut relay, Envelope::new(Message::error("Device ghost not connected"))).await;
        relay
    });

    let err = client.device_info("ghost").await.unwrap_err();
    assert!(matches!(err, AdminError::Remote(ref m) if m == "Device ghost not connected"));
    let _relay = relay_task.await.unwrap();
    client.close().await;
}

#[tokio::test]
async fn silence_times_out() {
    let (mut client, _relay, _dir) = connect(Duration::from_millis(200)).await;
    let err = client.create_dir("dev-1", "/sdcard/new").await.unwrap_err();
    assert!(matches!(err, AdminError::Timeout(_, "create_dir_response")));
    client.close().await;
}

#[tokio::test]
async fn upload_sends_ordered_chunks() {
    let (mut client, mut relay, dir) = connect(Duration::from_secs(5)).await;
    let local = dir.path().join("local.bin");
    let content: Vec<u8> = (0..50u8).collect();
    std::fs::write(&local, &content).unwrap();

    let sent = client.upload("dev-1", &local, "/sdcard/up.bin").await.unwrap();
    assert_eq!(sent, 50);

    let mut received = Vec::new();
    loop {
        let envelope = receive(&mut relay).await;
        assert_eq!(envelope.device_id.as_deref(), Some("dev-1"));
        let Message::UploadFile {
            path,
            data,
            offset,
            is_last,
            total_size,
        } = envelope.message
        else {
            panic!("expected upload_file");
        };
        assert_eq!(path, "/sdcard/up.bin");
        assert_eq!(offset, received.len() as u64);
        assert_eq!(total_size, Some(50));
        received.extend(Chunk::from_wire(offset, &data, is_last, total_size).unwrap().data);
        if is_last {
            break;
        }
    }
    assert_eq!(received, content);
    client.close().await;
}

#[tokio::test]
async fn close_right_after_upload_still_delivers_every_chunk() {
    let (mut client, mut relay, dir) = connect(Duration::from_secs(5)).await;
    let local = dir.path().join("big.bin");
    let content: Vec<u8> = (0..2000u32).map(|i| (i % 251) as u8).collect();
    std::fs::write(&local, &content).unwrap();

    let sent = client.upload("dev-1", &local, "/sdcard/big.bin").await.unwrap();
    assert_eq!(sent, 2000);
    client.close().await;

    let mut chunks = 0;
    let mut saw_last = false;
    while let Ok(Some(Ok(frame))) =
        tokio::time::timeout(Duration::from_secs(2), relay.next()).await
    {
        match frame {
            WsMessage::Text(text) => {
                if let Message::UploadFile { is_last, .. } = decode(&text).unwrap().message {
                    chunks += 1;
                    saw_last |= is_last;
                }
            }
            WsMessage::Close(_) => break,
            _ => {}
        }
    }
    assert_eq!(chunks, 125);
    assert!(saw_last);
}
