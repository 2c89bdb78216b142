use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Database model for rooms table
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoomModel {
    pub id: Uuid,
    pub theme: String,
}

impl RoomModel {
    /// Creates a new room model with a generated ID
    pub fn new(theme: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            theme,
        }
    }
}
