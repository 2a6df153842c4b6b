use anyhow::{Context, Result};
use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::timeout;

use tandem_client::SignalingOutput;
use tandem_core::{ClientMessage, ConnectionId};
use tandem_server::SignalingRelay;

/// Captures everything a session sends.
#[derive(Clone)]
pub struct MockSignalingOutput {
    tx: mpsc::UnboundedSender<ClientMessage>,
}

impl MockSignalingOutput {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ClientMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl SignalingOutput for MockSignalingOutput {
    async fn send_signal(&self, msg: ClientMessage) -> Result<()> {
        tracing::debug!("[MockSignaling] {}", msg.kind());
        self.tx.send(msg).context("capture channel closed")
    }
}

pub async fn next_signal(rx: &mut mpsc::UnboundedReceiver<ClientMessage>) -> Result<ClientMessage> {
    timeout(Duration::from_secs(2), rx.recv())
        .await
        .context("Timed out waiting for a signal")?
        .context("Signal channel closed")
}

/// Feeds frames straight into an in-process relay as connection `id`.
pub struct RelaySignaling {
    pub relay: SignalingRelay,
    pub id: ConnectionId,
}

#[async_trait]
impl SignalingOutput for RelaySignaling {
    async fn send_signal(&self, msg: ClientMessage) -> Result<()> {
        self.relay.handle(self.id, msg);
        Ok(())
    }
}
