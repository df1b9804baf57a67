//! The socket underneath the push channel.

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use url::Url;

use crate::error::ChannelError;

/// Opens push connections.
#[async_trait]
pub trait PushTransport: Send + Sync {
    async fn connect(&self) -> Result<Box<dyn PushConnection>, ChannelError>;
}

/// One open push connection.
#[async_trait]
pub trait PushConnection: Send {
    async fn send_text(&mut self, text: String) -> Result<(), ChannelError>;

    /// Next text message. `None` once the server has closed the connection.
    async fn next_text(&mut self) -> Option<Result<String, ChannelError>>;

    async fn close(&mut self);
}

/// WebSocket transport over `tokio-tungstenite`.
pub struct WebSocketTransport {
    url: Url,
}

impl WebSocketTransport {
    pub fn new(url: Url) -> Self {
        WebSocketTransport { url }
    }
}

#[async_trait]
impl PushTransport for WebSocketTransport {
    async fn connect(&self) -> Result<Box<dyn PushConnection>, ChannelError> {
        let (stream, response) =
            connect_async(self.url.as_str())
                .await
                .map_err(|e| ChannelError::Connect {
                    url: self.url.to_string(),
                    reason: e.to_string(),
                })?;
        tracing::debug!(url = %self.url, status = %response.status(), "websocket handshake done");
        Ok(Box::new(WebSocketConnection { stream }))
    }
}

struct WebSocketConnection {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl PushConnection for WebSocketConnection {
    async fn send_text(&mut self, text: String) -> Result<(), ChannelError> {
        self.stream.send(Message::text(text)).await?;
        Ok(())
    }

    async fn next_text(&mut self) -> Option<Result<String, ChannelError>> {
        loop {
            match self.stream.next().await? {
                Ok(Message::Text(text)) => return Some(Ok(text.as_str().to_owned())),
                Ok(Message::Close(frame)) => {
                    tracing::debug!(?frame, "server closed push channel");
                    return None;
                }
                Ok(Message::Binary(_)) => tracing::debug!("ignoring binary push frame"),
                // Pings are answered by tungstenite itself.
                Ok(_) => {}
                Err(e) => return Some(Err(e.into())),
            }
        }
    }

    async fn close(&mut self) {
        if let Err(e) = self.stream.close(None).await {
            tracing::debug!(error = %e, "error closing push channel");
        }
    }
}
