use anyhow::Result;
use async_trait::async_trait;
use tandem_core::ClientMessage;

/// Outbound half of the relay connection.
#[async_trait]
pub trait SignalingOutput: Send + Sync {
    async fn send_signal(&self, msg: ClientMessage) -> Result<()>;
}
