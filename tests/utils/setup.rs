use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use uuid::Uuid;

use ask_me_anything::event::ConnectionId;
use ask_me_anything::{Publisher, Session, SessionState, SocketError, SubscriberRegistry};

use super::mocks::{MockInboundSocket, MockOutboundSocket};

/// A connected subscriber driven by a real session
#[allow(dead_code)]
pub struct TestSubscriber {
    pub connection_id: ConnectionId,
    pub socket: Arc<MockOutboundSocket>,
    pub client: mpsc::UnboundedSender<Result<String, SocketError>>,
    pub handle: JoinHandle<SessionState>,
}

/// One room with a registry and publisher shared by all of its subscribers
pub struct TestRoom {
    pub room_id: Uuid,
    pub registry: Arc<SubscriberRegistry>,
    pub publisher: Publisher,
}

#[allow(dead_code)]
impl TestRoom {
    pub fn new() -> Self {
        let registry = Arc::new(SubscriberRegistry::new());
        Self {
            room_id: Uuid::new_v4(),
            publisher: Publisher::new(Arc::clone(&registry)),
            registry,
        }
    }

    /// Another room sharing this room's registry
    pub fn sibling(&self) -> Self {
        Self {
            room_id: Uuid::new_v4(),
            registry: Arc::clone(&self.registry),
            publisher: self.publisher.clone(),
        }
    }

    /// Starts a session with the given outbound socket and waits for it to register
    pub async fn connect_with(&self, socket: Arc<MockOutboundSocket>) -> TestSubscriber {
        let expected = self.registry.subscriber_count(self.room_id) + 1;
        let (inbound, client) = MockInboundSocket::new();
        let session = Session::new(Arc::clone(&self.registry), self.room_id);
        let connection_id = session.connection_id();
        let handle = tokio::spawn(session.start(socket.clone(), Box::new(inbound)));

        wait_for_subscribers(&self.registry, self.room_id, expected).await;
        TestSubscriber {
            connection_id,
            socket,
            client,
            handle,
        }
    }

    /// Fires the cancellation handle the registry issued for a connection
    pub fn cancel(&self, connection_id: ConnectionId) {
        for subscription in self.registry.snapshot(self.room_id) {
            if subscription.connection_id == connection_id {
                subscription.cancel.cancel();
            }
        }
    }

    pub async fn connect(&self) -> TestSubscriber {
        self.connect_with(Arc::new(MockOutboundSocket::new())).await
    }
}

/// Waits until a room has exactly `expected` subscribers
pub async fn wait_for_subscribers(registry: &SubscriberRegistry, room_id: Uuid, expected: usize) {
    tokio::time::timeout(Duration::from_secs(2), async {
        while registry.subscriber_count(room_id) != expected {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("timed out waiting for subscribers");
}

/// Waits until the socket has received at least `expected` frames
#[allow(dead_code)]
pub async fn wait_for_frames(socket: &MockOutboundSocket, expected: usize) -> Vec<String> {
    tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            let frames = socket.frames();
            if frames.len() >= expected {
                return frames;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("timed out waiting for frames")
}
