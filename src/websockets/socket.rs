use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::time::timeout;

/// Upper bound on a single frame write before the subscriber is treated as broken
const SEND_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum SocketError {
    #[error("connection closed")]
    ConnectionClosed,

    #[error("send failed: {0}")]
    SendFailed(String),

    #[error("send timed out after {0:?}")]
    SendTimeout(Duration),

    #[error("receive failed: {0}")]
    ReceiveFailed(String),
}

/// Write half of a subscriber connection
///
/// Implementations must be safe to call from several publishers at once; each
/// call delivers one whole frame, and frames reach the client in the order the
/// calls acquired the socket.
#[async_trait]
pub trait OutboundSocket: Send + Sync {
    /// Send a text frame to the client
    async fn send_message(&self, message: String) -> Result<(), SocketError>;

    /// Close the connection
    async fn close(&self) -> Result<(), SocketError>;
}

/// Read half of a subscriber connection
#[async_trait]
pub trait InboundSocket: Send {
    /// Receive the next text frame from the client (None once the client has closed)
    async fn receive_message(&mut self) -> Result<Option<String>, SocketError>;
}

/// Splits an upgraded axum WebSocket into its shareable write half and its read half
pub fn split_socket(socket: WebSocket) -> (Arc<WebSocketSender>, SplitStream<WebSocket>) {
    let (sink, stream) = socket.split();
    (Arc::new(WebSocketSender::new(sink)), stream)
}

/// Write half of an axum WebSocket, serialized behind an async mutex
pub struct WebSocketSender {
    sink: Mutex<SplitSink<WebSocket, Message>>,
}

impl WebSocketSender {
    pub fn new(sink: SplitSink<WebSocket, Message>) -> Self {
        Self {
            sink: Mutex::new(sink),
        }
    }
}

#[async_trait]
impl OutboundSocket for WebSocketSender {
    async fn send_message(&self, message: String) -> Result<(), SocketError> {
        let mut sink = self.sink.lock().await;
        match timeout(SEND_TIMEOUT, sink.send(Message::Text(message))).await {
            Ok(result) => result.map_err(|e| SocketError::SendFailed(e.to_string())),
            Err(_) => Err(SocketError::SendTimeout(SEND_TIMEOUT)),
        }
    }

    async fn close(&self) -> Result<(), SocketError> {
        // Closing flushes, which stalls on a client that stopped reading
        let close = async {
            self.sink
                .lock()
                .await
                .close()
                .await
                .map_err(|e| SocketError::SendFailed(e.to_string()))
        };
        match timeout(SEND_TIMEOUT, close).await {
            Ok(result) => result,
            Err(_) => Err(SocketError::SendTimeout(SEND_TIMEOUT)),
        }
    }
}

#[async_trait]
impl InboundSocket for SplitStream<WebSocket> {
    async fn receive_message(&mut self) -> Result<Option<String>, SocketError> {
        loop {
            match self.next().await {
                Some(Ok(Message::Text(text))) => return Ok(Some(text)),
                Some(Ok(Message::Close(_))) | None => return Ok(None),
                // Pings are answered by axum; binary and pong frames carry nothing for us
                Some(Ok(_)) => continue,
                Some(Err(e)) => return Err(SocketError::ReceiveFailed(e.to_string())),
            }
        }
    }
}
