//! Session run loop: connect, register, forward, reconnect.

use std::time::Duration;

use futures_util::StreamExt;
use remotefm_protocol::{decode, Envelope, Message};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_util::sync::CancellationToken;

use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::link::{log_task_result, Dispatcher, Link};
use crate::outbound::{write_frames, Outbound};
use crate::state::SessionState;
use crate::transport::{BoxTransport, Connector, WsConnector};

/// How long a stopping link waits for its close frame to be queued.
const CLOSE_GRACE: Duration = Duration::from_secs(1);

/// How long a stopping link may spend writing out envelopes that were
/// accepted by [`SessionHandle::send`] before the stop.
const FLUSH_GRACE: Duration = Duration::from_secs(10);

/// Handle to a running Connection Session.
///
/// Dropping the handle stops the session.
pub struct SessionHandle {
    commands: mpsc::Sender<Envelope>,
    state: watch::Receiver<SessionState>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl SessionHandle {
    /// Start a session over real WebSockets.
    pub fn start<D: Dispatcher>(config: SessionConfig, dispatcher: D) -> Self {
        Self::start_with(config, dispatcher, WsConnector)
    }

    /// Start a session with a custom [`Connector`].
    pub fn start_with<D, C>(config: SessionConfig, dispatcher: D, connector: C) -> Self
    where
        D: Dispatcher,
        C: Connector,
    {
        let (state_tx, state_rx) = watch::channel(SessionState::Idle);
        let (command_tx, command_rx) = mpsc::channel(config.outbound_capacity.max(1));
        let cancel = CancellationToken::new();

        let task = tokio::spawn(run_session(
            config,
            dispatcher,
            connector,
            state_tx,
            command_rx,
            cancel.clone(),
        ));

        Self {
            commands: command_tx,
            state: state_rx,
            cancel,
            task: Some(task),
        }
    }

    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    /// Watch state transitions.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.clone()
    }

    /// Wait until the session is `Active`, up to `timeout`.
    pub async fn wait_active(&self, timeout: Duration) -> Result<(), SessionError> {
        let mut state = self.state.clone();
        let waited =
            tokio::time::timeout(timeout, state.wait_for(|s| *s == SessionState::Active)).await;
        let result = match waited {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(_)) => Err(SessionError::Closed),
            Err(_) => Err(SessionError::Timeout("an active session")),
        };
        result
    }

    /// Queue an envelope on the current link. Fails fast unless `Active`.
    pub async fn send(&self, envelope: Envelope) -> Result<(), SessionError> {
        if self.state() != SessionState::Active {
            return Err(SessionError::NotConnected);
        }
        self.commands
            .send(envelope)
            .await
            .map_err(|_| SessionError::Closed)
    }

    pub async fn send_message(&self, message: Message) -> Result<(), SessionError> {
        self.send(Envelope::new(message)).await
    }

    /// Stop the session and wait for it to wind down. No reconnect is
    /// attempted afterwards, even if a reconnect delay was pending.
    pub async fn stop(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "Session task ended abnormally");
            }
        }
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

enum LinkEnd {
    Stopped,
    Dropped(String),
}

async fn run_session<D, C>(
    config: SessionConfig,
    mut dispatcher: D,
    connector: C,
    state: watch::Sender<SessionState>,
    mut commands: mpsc::Receiver<Envelope>,
    cancel: CancellationToken,
) where
    D: Dispatcher,
    C: Connector,
{
    loop {
        state.send_replace(SessionState::Connecting);
        tracing::info!(url = %config.url, role = %config.role, "Connecting to relay...");

        let connected = tokio::select! {
            _ = cancel.cancelled() => break,
            result = tokio::time::timeout(config.connect_timeout, connector.connect(&config.url)) => result,
        };

        match connected {
            Ok(Ok(transport)) => {
                let end = run_link(
                    transport,
                    &config,
                    &mut dispatcher,
                    &state,
                    &mut commands,
                    &cancel,
                )
                .await;
                dispatcher.link_closed();
                match end {
                    LinkEnd::Stopped => break,
                    LinkEnd::Dropped(reason) => {
                        tracing::warn!(reason = %reason, "Relay connection lost");
                    }
                }
            }
            Ok(Err(e)) => tracing::warn!(error = %e, "Failed to connect to relay"),
            Err(_) => tracing::warn!(
                timeout = ?config.connect_timeout,
                "Timed out connecting to relay"
            ),
        }

        state.send_replace(SessionState::Idle);
        tracing::info!(delay = ?config.reconnect_delay, "Reconnecting after delay");

        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(config.reconnect_delay) => {}
        }
    }

    state.send_replace(SessionState::Idle);
    tracing::info!(role = %config.role, "Session stopped");
}

async fn run_link<D: Dispatcher>(
    transport: BoxTransport,
    config: &SessionConfig,
    dispatcher: &mut D,
    state: &watch::Sender<SessionState>,
    commands: &mut mpsc::Receiver<Envelope>,
    cancel: &CancellationToken,
) -> LinkEnd {
    let (sink, mut stream) = transport.split();
    let (outbound, frames) = Outbound::channel(config.outbound_capacity);
    let mut writer = tokio::spawn(write_frames(sink, frames, config.ping_interval));
    let mut writer_done = false;
    let mut link = Link::new(outbound.clone());

    state.send_replace(SessionState::Open);
    tracing::info!("Relay connection open");

    let mut end = None;
    match dispatcher.registration() {
        Some(registration) => match outbound.send(&registration).await {
            Ok(()) => {
                state.send_replace(SessionState::Registering);
            }
            Err(e) => end = Some(LinkEnd::Dropped(format!("failed to send registration: {e}"))),
        },
        None => {
            state.send_replace(SessionState::Active);
        }
    }

    let end = match end {
        Some(end) => end,
        None => loop {
            tokio::select! {
                _ = cancel.cancelled() => break LinkEnd::Stopped,

                result = &mut writer, if !writer_done => {
                    writer_done = true;
                    let reason = match result {
                        Ok(Ok(())) => "writer finished".to_string(),
                        Ok(Err(e)) => format!("write failed: {e}"),
                        Err(e) => format!("writer task failed: {e}"),
                    };
                    break LinkEnd::Dropped(reason);
                }

                Some(done) = link.tasks.join_next(), if !link.tasks.is_empty() => {
                    log_task_result(done);
                }

                Some(envelope) = commands.recv() => {
                    if let Err(e) = outbound.send(&envelope).await {
                        tracing::warn!(error = %e, kind = envelope.kind(), "Failed to queue command");
                    }
                }

                frame = stream.next() => match frame {
                    Some(Ok(WsMessage::Text(text))) => match decode(&text) {
                        Ok(envelope) => {
                            if *state.borrow() == SessionState::Registering {
                                if !matches!(envelope.message, Message::Registered { .. }) {
                                    tracing::debug!(
                                        kind = envelope.kind(),
                                        "Ignoring envelope before registration is acknowledged"
                                    );
                                    continue;
                                }
                                state.send_replace(SessionState::Active);
                                tracing::info!("Registered with relay");
                            }
                            dispatcher.dispatch(envelope, &mut link).await;
                        }
                        Err(e) => tracing::warn!(error = %e, "Dropping undecodable frame"),
                    },
                    Some(Ok(WsMessage::Ping(data))) => {
                        let _ = outbound.send_raw(WsMessage::Pong(data)).await;
                    }
                    Some(Ok(WsMessage::Close(_))) | None => {
                        break LinkEnd::Dropped("closed by peer".into());
                    }
                    Some(Err(e)) => break LinkEnd::Dropped(format!("read failed: {e}")),
                    Some(Ok(_)) => {}
                },
            }
        },
    };

    if matches!(end, LinkEnd::Stopped) {
        state.send_replace(SessionState::Closing);
        let flush = flush_commands(commands, &outbound);
        if tokio::time::timeout(FLUSH_GRACE, flush).await.is_err() {
            tracing::warn!("Gave up flushing queued envelopes on stop");
        }
        let close = outbound.send_raw(WsMessage::Close(None));
        let _ = tokio::time::timeout(CLOSE_GRACE, close).await;
    }

    // Handler tasks hold outbound clones; once they and ours are gone the
    // writer sees a closed queue and shuts the sink.
    link.shutdown().await;
    drop(link);
    drop(outbound);
    if !writer_done && tokio::time::timeout(FLUSH_GRACE, &mut writer).await.is_err() {
        writer.abort();
    }

    end
}

/// Move envelopes already accepted from the handle onto the link so a stop
/// right after a send does not lose them.
async fn flush_commands(commands: &mut mpsc::Receiver<Envelope>, outbound: &Outbound) {
    while let Ok(envelope) = commands.try_recv() {
        if let Err(e) = outbound.send(&envelope).await {
            tracing::debug!(error = %e, kind = envelope.kind(), "Queued envelope dropped on stop");
            return;
        }
    }
}
