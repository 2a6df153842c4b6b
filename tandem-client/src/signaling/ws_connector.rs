use crate::signaling::SignalingOutput;
use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tandem_core::{ClientMessage, ServerMessage};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, warn};

/// Queues frames for the socket writer task.
#[derive(Clone)]
pub struct WsSignaling {
    tx: mpsc::UnboundedSender<ClientMessage>,
}

#[async_trait]
impl SignalingOutput for WsSignaling {
    async fn send_signal(&self, msg: ClientMessage) -> Result<()> {
        self.tx
            .send(msg)
            .map_err(|_| anyhow::anyhow!("Relay connection is closed"))
    }
}

/// Opens the relay WebSocket.
///
/// Returns the outbound handle and the stream of frames the relay sends. The
/// stream ends when the socket closes.
pub async fn connect(
    relay_url: &str,
) -> Result<(WsSignaling, mpsc::UnboundedReceiver<ServerMessage>)> {
    let (socket, _) = connect_async(relay_url)
        .await
        .with_context(|| format!("Failed to connect to relay at {relay_url}"))?;
    info!("Connected to relay at {}", relay_url);

    let (mut sink, mut stream) = socket.split();
    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<ClientMessage>();
    let (in_tx, in_rx) = mpsc::unbounded_channel::<ServerMessage>();

    tokio::spawn(async move {
        while let Some(msg) = out_rx.recv().await {
            let text = match serde_json::to_string(&msg) {
                Ok(text) => text,
                Err(e) => {
                    error!("Failed to encode {}: {}", msg.kind(), e);
                    continue;
                }
            };
            if sink.send(Message::text(text)).await.is_err() {
                break;
            }
        }
        let _ = sink.close().await;
    });

    tokio::spawn(async move {
        while let Some(frame) = stream.next().await {
            match frame {
                Ok(Message::Text(text)) => match serde_json::from_str(text.as_str()) {
                    Ok(msg) => {
                        if in_tx.send(msg).is_err() {
                            break;
                        }
                    }
                    Err(e) => warn!("Invalid frame from relay: {}", e),
                },
                Ok(Message::Close(_)) => break,
                Ok(_) => {}
                Err(e) => {
                    debug!("Relay socket error: {}", e);
                    break;
                }
            }
        }
        info!("Relay connection closed");
    });

    Ok((WsSignaling { tx: out_tx }, in_rx))
}
