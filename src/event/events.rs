use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display};
use uuid::Uuid;

/// Kinds of live updates pushed to room subscribers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum EventKind {
    MessageCreated,
    MessageReactionIncreased,
    MessageReactionDecreased,
    MessageAnswered,
}

/// Kind-specific data carried by an event
///
/// Serializes adjacently tagged, which is exactly the frame a subscriber receives:
/// `{"kind": "message_created", "value": {"id": "...", "message": "..."}}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum EventPayload {
    /// A new message was posted to the room
    MessageCreated { id: String, message: String },

    /// A message received a reaction; `count` is the new total
    MessageReactionIncreased { id: String, count: i64 },

    /// A reaction was removed from a message; `count` is the new total
    MessageReactionDecreased { id: String, count: i64 },

    /// A message was marked as answered
    MessageAnswered { id: String },
}

impl EventPayload {
    pub fn kind(&self) -> EventKind {
        match self {
            EventPayload::MessageCreated { .. } => EventKind::MessageCreated,
            EventPayload::MessageReactionIncreased { .. } => EventKind::MessageReactionIncreased,
            EventPayload::MessageReactionDecreased { .. } => EventKind::MessageReactionDecreased,
            EventPayload::MessageAnswered { .. } => EventKind::MessageAnswered,
        }
    }

    /// Id of the message this payload describes
    pub fn message_id(&self) -> &str {
        match self {
            EventPayload::MessageCreated { id, .. } => id,
            EventPayload::MessageReactionIncreased { id, .. } => id,
            EventPayload::MessageReactionDecreased { id, .. } => id,
            EventPayload::MessageAnswered { id } => id,
        }
    }
}

/// Something that happened to a message in a room
///
/// Events are facts: they are built after the store has accepted a change and are
/// never mutated afterwards. The room id only routes the event to the right
/// subscribers and is not part of the frame sent to clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    room_id: Uuid,
    payload: EventPayload,
}

impl Event {
    pub fn new(room_id: Uuid, payload: EventPayload) -> Self {
        Self { room_id, payload }
    }

    pub fn message_created(
        room_id: Uuid,
        message_id: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::new(
            room_id,
            EventPayload::MessageCreated {
                id: message_id.into(),
                message: message.into(),
            },
        )
    }

    pub fn reaction_increased(room_id: Uuid, message_id: impl Into<String>, count: i64) -> Self {
        Self::new(
            room_id,
            EventPayload::MessageReactionIncreased {
                id: message_id.into(),
                count,
            },
        )
    }

    pub fn reaction_decreased(room_id: Uuid, message_id: impl Into<String>, count: i64) -> Self {
        Self::new(
            room_id,
            EventPayload::MessageReactionDecreased {
                id: message_id.into(),
                count,
            },
        )
    }

    pub fn message_answered(room_id: Uuid, message_id: impl Into<String>) -> Self {
        Self::new(
            room_id,
            EventPayload::MessageAnswered {
                id: message_id.into(),
            },
        )
    }

    pub fn room_id(&self) -> Uuid {
        self.room_id
    }

    pub fn kind(&self) -> EventKind {
        self.payload.kind()
    }

    pub fn payload(&self) -> &EventPayload {
        &self.payload
    }

    /// Serializes the event into the JSON frame delivered to subscribers
    pub fn to_frame(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.payload)
    }
}
