//! Serialized outbound path of a link.
//!
//! Every sender pushes whole frames into one bounded queue; a single writer
//! task owns the sink. A full queue makes senders wait, which is how slow
//! links push back on file streaming.

use std::time::Duration;

use futures_util::{Sink, SinkExt};
use remotefm_protocol::{encode, Envelope, Message};
use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_tungstenite::tungstenite::{Error as WsError, Message as WsMessage};
use tracing::{debug, trace};

use crate::error::SessionError;

/// Cloneable handle onto a link's outbound queue.
#[derive(Debug, Clone)]
pub struct Outbound {
    tx: mpsc::Sender<WsMessage>,
}

impl Outbound {
    /// Create a queue with room for `capacity` frames. The receiver is
    /// normally handed to the link's writer task; tests read it directly.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<WsMessage>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }

    /// Encode and queue one envelope as a single text frame.
    pub async fn send(&self, envelope: &Envelope) -> Result<(), SessionError> {
        let text = encode(envelope)?;
        trace!(kind = envelope.kind(), len = text.len(), "Queueing frame");
        self.send_raw(WsMessage::Text(text.into())).await
    }

    pub async fn send_message(&self, message: Message) -> Result<(), SessionError> {
        self.send(&Envelope::new(message)).await
    }

    pub(crate) async fn send_raw(&self, frame: WsMessage) -> Result<(), SessionError> {
        self.tx.send(frame).await.map_err(|_| SessionError::Closed)
    }
}

/// Writer task: drains the queue into the sink and sends keep-alive pings.
///
/// Returns when every [`Outbound`] is dropped (after closing the sink) or
/// when the sink fails.
pub(crate) async fn write_frames<S>(
    mut sink: S,
    mut frames: mpsc::Receiver<WsMessage>,
    ping_interval: Duration,
) -> Result<(), WsError>
where
    S: Sink<WsMessage, Error = WsError> + Unpin,
{
    let mut ping = interval_at(Instant::now() + ping_interval, ping_interval);
    ping.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            frame = frames.recv() => match frame {
                Some(frame) => sink.send(frame).await?,
                None => {
                    debug!("Outbound queue closed, closing sink");
                    let _ = sink.close().await;
                    return Ok(());
                }
            },
            _ = ping.tick() => {
                trace!("Sending keep-alive ping");
                sink.send(WsMessage::Ping(Default::default())).await?;
            }
        }
    }
}
