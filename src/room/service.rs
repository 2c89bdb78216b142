use std::sync::Arc;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use super::{
    models::RoomModel,
    repository::RoomRepository,
    types::{CreateRoomRequest, CreateRoomResponse, RoomResponse},
};
use crate::shared::{validate_text, AppError};

/// Service for handling room business logic
pub struct RoomService {
    repository: Arc<dyn RoomRepository + Send + Sync>,
}

impl RoomService {
    pub fn new(repository: Arc<dyn RoomRepository + Send + Sync>) -> Self {
        Self { repository }
    }

    /// Creates a new room with a generated ID
    #[instrument(skip(self))]
    pub async fn create_room(
        &self,
        request: CreateRoomRequest,
    ) -> Result<CreateRoomResponse, AppError> {
        validate_text("theme", &request.theme)?;

        let room = RoomModel::new(request.theme);
        self.repository.create_room(&room).await?;

        info!(room_id = %room.id, theme = %room.theme, "Room created successfully");

        Ok(CreateRoomResponse { id: room.id })
    }

    #[instrument(skip(self))]
    pub async fn get_room(&self, room_id: Uuid) -> Result<RoomResponse, AppError> {
        self.repository
            .get_room(room_id)
            .await?
            .map(RoomResponse::from)
            .ok_or_else(|| AppError::NotFound("room not found".to_string()))
    }

    /// Lists all rooms
    #[instrument(skip(self))]
    pub async fn list_rooms(&self) -> Result<Vec<RoomResponse>, AppError> {
        let rooms = self.repository.list_rooms().await?;
        debug!(room_count = rooms.len(), "Rooms retrieved");

        Ok(rooms.into_iter().map(RoomResponse::from).collect())
    }

    /// Fails with `NotFound` unless the room exists
    #[instrument(skip(self))]
    pub async fn ensure_room_exists(&self, room_id: Uuid) -> Result<(), AppError> {
        if self.repository.room_exists(room_id).await? {
            Ok(())
        } else {
            debug!(room_id = %room_id, "Room not found");
            Err(AppError::NotFound("room not found".to_string()))
        }
    }
}
