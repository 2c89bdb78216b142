use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tokio::sync::mpsc;

use ask_me_anything::{InboundSocket, OutboundSocket, SocketError};

// ============================================================================
// Mock Infrastructure
// ============================================================================

#[derive(Default)]
pub struct MockOutboundSocket {
    frames: Mutex<Vec<String>>,
    broken: AtomicBool,
    closed: AtomicBool,
}

#[allow(dead_code)]
impl MockOutboundSocket {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn broken() -> Self {
        let socket = Self::default();
        socket.broken.store(true, Ordering::SeqCst);
        socket
    }

    pub fn frames(&self) -> Vec<String> {
        self.frames.lock().unwrap().clone()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OutboundSocket for MockOutboundSocket {
    async fn send_message(&self, message: String) -> Result<(), SocketError> {
        if self.broken.load(Ordering::SeqCst) {
            return Err(SocketError::SendFailed("connection reset".to_string()));
        }
        if self.is_closed() {
            return Err(SocketError::ConnectionClosed);
        }
        self.frames.lock().unwrap().push(message);
        Ok(())
    }

    async fn close(&self) -> Result<(), SocketError> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Client side of a subscriber connection; dropping the sender disconnects it
pub struct MockInboundSocket {
    receiver: mpsc::UnboundedReceiver<Result<String, SocketError>>,
}

#[allow(dead_code)]
impl MockInboundSocket {
    pub fn new() -> (Self, mpsc::UnboundedSender<Result<String, SocketError>>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { receiver }, sender)
    }
}

#[async_trait]
impl InboundSocket for MockInboundSocket {
    async fn receive_message(&mut self) -> Result<Option<String>, SocketError> {
        match self.receiver.recv().await {
            Some(Ok(message)) => Ok(Some(message)),
            Some(Err(e)) => Err(e),
            None => Ok(None),
        }
    }
}
