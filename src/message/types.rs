use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::models::MessageModel;

/// Request payload for posting a message to a room
#[derive(Debug, Deserialize)]
pub struct CreateMessageRequest {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateMessageResponse {
    pub id: Uuid,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub id: Uuid,
    pub message: String,
    pub reaction_count: i64,
    pub answered: bool,
}

impl From<MessageModel> for MessageResponse {
    fn from(message: MessageModel) -> Self {
        Self {
            id: message.id,
            message: message.message,
            reaction_count: message.reaction_count,
            answered: message.answered,
        }
    }
}

/// Reaction total after a react or unreact request
#[derive(Debug, Serialize, Deserialize)]
pub struct ReactionCountResponse {
    pub count: i64,
}
