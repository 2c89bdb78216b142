use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio_util::sync::CancellationToken;
use tracing::debug;
use uuid::Uuid;

use crate::websockets::OutboundSocket;

/// Identity of one accepted subscriber connection
pub type ConnectionId = Uuid;

/// A live connection registered for a room, together with the handle that ends it
#[derive(Clone)]
pub struct Subscription {
    pub connection_id: ConnectionId,
    pub socket: Arc<dyn OutboundSocket>,
    pub cancel: CancellationToken,
}

type RoomSubscribers = HashMap<ConnectionId, Subscription>;

#[derive(Default)]
struct Rooms {
    members: HashMap<Uuid, RoomSubscribers>,
    /// Room each connection is currently registered in
    connections: HashMap<ConnectionId, Uuid>,
}

impl Rooms {
    fn remove(&mut self, room_id: Uuid, connection_id: ConnectionId) -> Option<usize> {
        let members = self.members.get_mut(&room_id)?;
        members.remove(&connection_id)?;

        let remaining = members.len();
        if remaining == 0 {
            self.members.remove(&room_id);
        }
        if self.connections.get(&connection_id) == Some(&room_id) {
            self.connections.remove(&connection_id);
        }
        Some(remaining)
    }
}

/// Per-room registry of live subscriber connections
///
/// All access goes through one mutex that is only held while the map is mutated or
/// copied, never across an await point. Every cancellation handle handed out is a
/// child of the registry's shutdown token, so `shutdown` ends every session at once.
pub struct SubscriberRegistry {
    rooms: Mutex<Rooms>,
    shutdown: CancellationToken,
}

impl Default for SubscriberRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SubscriberRegistry {
    pub fn new() -> Self {
        Self {
            rooms: Mutex::new(Rooms::default()),
            shutdown: CancellationToken::new(),
        }
    }

    fn rooms(&self) -> MutexGuard<'_, Rooms> {
        // The map stays consistent even if a holder panicked; every critical section is a single insert/remove/copy
        self.rooms.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Adds a connection to a room and returns its fresh cancellation handle
    ///
    /// Registering a connection that is already present replaces its entry, and a
    /// connection registered for another room is moved here.
    pub fn register(
        &self,
        room_id: Uuid,
        connection_id: ConnectionId,
        socket: Arc<dyn OutboundSocket>,
    ) -> CancellationToken {
        let cancel = self.shutdown.child_token();
        let subscription = Subscription {
            connection_id,
            socket,
            cancel: cancel.clone(),
        };

        let mut rooms = self.rooms();
        if let Some(previous_room) = rooms.connections.insert(connection_id, room_id) {
            if previous_room != room_id {
                rooms.remove(previous_room, connection_id);
            }
        }

        let members = rooms.members.entry(room_id).or_default();
        members.insert(connection_id, subscription);

        debug!(
            room_id = %room_id,
            connection_id = %connection_id,
            subscribers = members.len(),
            "Subscriber registered"
        );

        cancel
    }

    /// Removes a connection from a room; returns whether it was present
    ///
    /// Removing an absent connection is a no-op. The room entry is dropped once
    /// its last subscriber leaves.
    pub fn deregister(&self, room_id: Uuid, connection_id: ConnectionId) -> bool {
        let Some(remaining) = self.rooms().remove(room_id, connection_id) else {
            return false;
        };

        debug!(
            room_id = %room_id,
            connection_id = %connection_id,
            subscribers = remaining,
            "Subscriber deregistered"
        );
        true
    }

    /// Copies the current subscribers of a room for iteration outside the lock
    pub fn snapshot(&self, room_id: Uuid) -> Vec<Subscription> {
        self.rooms()
            .members
            .get(&room_id)
            .map(|members| members.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn is_subscribed(&self, room_id: Uuid, connection_id: ConnectionId) -> bool {
        self.rooms()
            .members
            .get(&room_id)
            .is_some_and(|members| members.contains_key(&connection_id))
    }

    pub fn subscriber_count(&self, room_id: Uuid) -> usize {
        self.rooms().members.get(&room_id).map_or(0, HashMap::len)
    }

    /// Number of rooms that currently have at least one subscriber
    pub fn room_count(&self) -> usize {
        self.rooms().members.len()
    }

    /// Cancels every handle this registry has issued, including future ones
    pub fn shutdown(&self) {
        debug!(rooms = self.room_count(), "Cancelling all subscribers");
        self.shutdown.cancel();
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }
}
