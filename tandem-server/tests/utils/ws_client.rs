use anyhow::{Context, Result, bail};
use futures::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use tandem_core::{ClientMessage, ConnectionId, ServerMessage};
use tandem_server::{RelayConfig, serve_on};

use super::RECV_TIMEOUT_MS;

/// Starts a relay on an ephemeral localhost port.
pub async fn spawn_server() -> Result<SocketAddr> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(e) = serve_on(listener, RelayConfig::default()).await {
            tracing::error!("Test relay stopped: {e:#}");
        }
    });

    Ok(addr)
}

pub struct WsClient {
    pub id: ConnectionId,
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl WsClient {
    /// Opens the socket and reads the welcome frame.
    pub async fn connect(addr: SocketAddr) -> Result<Self> {
        let (stream, _) = connect_async(format!("ws://{addr}/ws"))
            .await
            .context("WebSocket handshake failed")?;
        let mut client = Self {
            id: ConnectionId::default(),
            stream,
        };

        match client.recv().await? {
            ServerMessage::Welcome { connection_id, .. } => client.id = connection_id,
            other => bail!("expected welcome, got {}", other.kind()),
        }
        Ok(client)
    }

    pub async fn send(&mut self, msg: &ClientMessage) -> Result<()> {
        let text = serde_json::to_string(msg)?;
        self.stream.send(Message::text(text)).await?;
        Ok(())
    }

    pub async fn recv(&mut self) -> Result<ServerMessage> {
        loop {
            let frame = timeout(Duration::from_millis(RECV_TIMEOUT_MS), self.stream.next())
                .await
                .context("Timed out waiting for a frame")?
                .context("Socket closed")??;

            match frame {
                Message::Text(text) => return Ok(serde_json::from_str(text.as_str())?),
                Message::Close(_) => bail!("Socket closed"),
                _ => continue,
            }
        }
    }

    pub async fn close(mut self) -> Result<()> {
        self.stream.close(None).await?;
        Ok(())
    }
}
