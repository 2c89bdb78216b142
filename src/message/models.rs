use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Database model for messages table
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessageModel {
    pub id: Uuid,
    pub room_id: Uuid,
    pub message: String,
    pub reaction_count: i64,
    pub answered: bool,
}

impl MessageModel {
    /// Creates an unanswered message with no reactions
    pub fn new(room_id: Uuid, message: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            room_id,
            message,
            reaction_count: 0,
            answered: false,
        }
    }
}
