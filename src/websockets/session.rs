use std::sync::Arc;
use std::time::Duration;
use strum_macros::Display;
use tokio::time::timeout;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::socket::{InboundSocket, OutboundSocket, SocketError};
use crate::event::{ConnectionId, SubscriberRegistry};

/// How long a closing session waits for the transport to shut down
const CLOSE_TIMEOUT: Duration = Duration::from_secs(10);

/// Lifecycle of a subscriber connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum SessionState {
    /// Transport upgraded for a room that is known to exist
    Accepted,
    /// Present in the registry with a cancellation handle
    Registered,
    /// Waiting for cancellation or for the client to go away
    Active,
    /// Leaving the registry
    Closing,
    /// Transport released
    Closed,
}

/// Why an active session stopped waiting
#[derive(Debug)]
enum CloseReason {
    Cancelled,
    ClientClosed,
    TransportError(SocketError),
}

/// Removes the connection from the registry when dropped
///
/// Held for the whole time the session is registered so every exit path,
/// including a panic while active, leaves the registry clean.
struct Registration {
    registry: Arc<SubscriberRegistry>,
    room_id: Uuid,
    connection_id: ConnectionId,
}

impl Drop for Registration {
    fn drop(&mut self) {
        self.registry.deregister(self.room_id, self.connection_id);
    }
}

/// One accepted subscriber connection for one room
///
/// The session does no work of its own while active: the publisher writes to the
/// outbound half directly. The session only reads the inbound half to notice the
/// client leaving, and waits for its cancellation handle.
pub struct Session {
    connection_id: ConnectionId,
    room_id: Uuid,
    registry: Arc<SubscriberRegistry>,
    state: SessionState,
    close_timeout: Duration,
}

impl Session {
    pub fn new(registry: Arc<SubscriberRegistry>, room_id: Uuid) -> Self {
        Self {
            connection_id: Uuid::new_v4(),
            room_id,
            registry,
            state: SessionState::Accepted,
            close_timeout: CLOSE_TIMEOUT,
        }
    }

    pub fn with_close_timeout(mut self, close_timeout: Duration) -> Self {
        self.close_timeout = close_timeout;
        self
    }

    pub fn connection_id(&self) -> ConnectionId {
        self.connection_id
    }

    pub fn room_id(&self) -> Uuid {
        self.room_id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    fn transition(&mut self, next: SessionState) {
        debug!(
            room_id = %self.room_id,
            connection_id = %self.connection_id,
            from = %self.state,
            to = %next,
            "Session state change"
        );
        self.state = next;
    }

    /// Runs the session until it is closed and returns the final state
    pub async fn start(
        mut self,
        outbound: Arc<dyn OutboundSocket>,
        mut inbound: Box<dyn InboundSocket>,
    ) -> SessionState {
        let cancel = self
            .registry
            .register(self.room_id, self.connection_id, Arc::clone(&outbound));
        let registration = Registration {
            registry: Arc::clone(&self.registry),
            room_id: self.room_id,
            connection_id: self.connection_id,
        };
        self.transition(SessionState::Registered);

        info!(
            room_id = %self.room_id,
            connection_id = %self.connection_id,
            "New client connected"
        );
        self.transition(SessionState::Active);

        let reason = loop {
            tokio::select! {
                _ = cancel.cancelled() => break CloseReason::Cancelled,

                msg = inbound.receive_message() => match msg {
                    Ok(Some(message)) => {
                        debug!(
                            connection_id = %self.connection_id,
                            length = message.len(),
                            "Ignoring message from subscriber"
                        );
                    }
                    Ok(None) => break CloseReason::ClientClosed,
                    Err(e) => break CloseReason::TransportError(e),
                },
            }
        };

        // Whatever ended the session, its handle must read as cancelled from now on
        cancel.cancel();

        match &reason {
            CloseReason::TransportError(e) => warn!(
                room_id = %self.room_id,
                connection_id = %self.connection_id,
                error = %e,
                "Subscriber connection failed"
            ),
            reason => info!(
                room_id = %self.room_id,
                connection_id = %self.connection_id,
                reason = ?reason,
                "Client disconnected"
            ),
        }

        self.transition(SessionState::Closing);
        drop(registration);

        match timeout(self.close_timeout, outbound.close()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => debug!(
                connection_id = %self.connection_id,
                error = %e,
                "Transport already closed"
            ),
            Err(_) => warn!(
                connection_id = %self.connection_id,
                timeout = ?self.close_timeout,
                "Gave up waiting for transport to close"
            ),
        }
        self.transition(SessionState::Closed);

        self.state
    }
}
