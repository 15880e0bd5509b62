use std::future::Future;

use async_trait::async_trait;
use remotefm_protocol::Envelope;
use tokio::task::JoinSet;
use tracing::warn;

use crate::outbound::Outbound;

/// One established transport, as seen by a [`Dispatcher`].
///
/// Work spawned through [`Link::spawn`] belongs to the link: it is aborted
/// when the transport drops or the session stops.
pub struct Link {
    outbound: Outbound,
    pub(crate) tasks: JoinSet<()>,
}

impl Link {
    pub fn new(outbound: Outbound) -> Self {
        Self {
            outbound,
            tasks: JoinSet::new(),
        }
    }

    pub fn outbound(&self) -> &Outbound {
        &self.outbound
    }

    pub fn spawn<F>(&mut self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.tasks.spawn(task);
    }

    /// Tasks spawned on this link that have not been reaped yet.
    pub fn in_flight(&self) -> usize {
        self.tasks.len()
    }

    /// Wait for every spawned task to finish.
    pub async fn join_all(&mut self) {
        while let Some(result) = self.tasks.join_next().await {
            log_task_result(result);
        }
    }

    pub(crate) async fn shutdown(&mut self) {
        self.tasks.shutdown().await;
    }
}

pub(crate) fn log_task_result(result: Result<(), tokio::task::JoinError>) {
    if let Err(e) = result {
        if e.is_panic() {
            warn!(error = %e, "Link task panicked");
        }
    }
}

/// Receives every decoded inbound envelope of a session, in arrival order.
#[async_trait]
pub trait Dispatcher: Send + 'static {
    /// Envelope sent first on every new transport. `None` means the role
    /// does not register and the session is active as soon as it opens.
    fn registration(&self) -> Option<Envelope>;

    /// Handle one envelope. Long-running work should go to
    /// [`Link::spawn`] so later envelopes are not held up.
    async fn dispatch(&mut self, envelope: Envelope, link: &mut Link);

    /// The transport is gone; drop any state tied to it.
    fn link_closed(&mut self) {}
}
