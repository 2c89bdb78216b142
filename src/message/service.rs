use std::sync::Arc;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use super::{
    repository::MessageRepository,
    types::{CreateMessageRequest, CreateMessageResponse, MessageResponse, ReactionCountResponse},
};
use crate::{
    event::{Event, Publisher},
    room::{RoomRepository, RoomService},
    shared::{validate_text, AppError},
};

/// Service for message business logic
///
/// Every successful write is followed by an event dispatched to the room's
/// subscribers. Dispatch is fire-and-forget, so fan-out never delays or fails
/// the request that caused it.
pub struct MessageService {
    rooms: RoomService,
    repository: Arc<dyn MessageRepository + Send + Sync>,
    publisher: Publisher,
}

impl MessageService {
    pub fn new(
        room_repository: Arc<dyn RoomRepository + Send + Sync>,
        repository: Arc<dyn MessageRepository + Send + Sync>,
        publisher: Publisher,
    ) -> Self {
        Self {
            rooms: RoomService::new(room_repository),
            repository,
            publisher,
        }
    }

    async fn ensure_message_exists(&self, room_id: Uuid, message_id: Uuid) -> Result<(), AppError> {
        self.rooms.ensure_room_exists(room_id).await?;

        if self.repository.message_exists(room_id, message_id).await? {
            Ok(())
        } else {
            debug!(room_id = %room_id, message_id = %message_id, "Message not found");
            Err(AppError::NotFound("message not found".to_string()))
        }
    }

    #[instrument(skip(self))]
    pub async fn create_message(
        &self,
        room_id: Uuid,
        request: CreateMessageRequest,
    ) -> Result<CreateMessageResponse, AppError> {
        self.rooms.ensure_room_exists(room_id).await?;

        validate_text("message", &request.message)?;

        let id = self
            .repository
            .insert_message(room_id, &request.message)
            .await?;

        info!(room_id = %room_id, message_id = %id, "Message created");

        self.publisher.dispatch(Event::message_created(
            room_id,
            id.to_string(),
            request.message,
        ));

        Ok(CreateMessageResponse { id })
    }

    #[instrument(skip(self))]
    pub async fn list_messages(&self, room_id: Uuid) -> Result<Vec<MessageResponse>, AppError> {
        self.rooms.ensure_room_exists(room_id).await?;

        let messages = self.repository.list_room_messages(room_id).await?;
        Ok(messages.into_iter().map(MessageResponse::from).collect())
    }

    #[instrument(skip(self))]
    pub async fn get_message(
        &self,
        room_id: Uuid,
        message_id: Uuid,
    ) -> Result<MessageResponse, AppError> {
        self.rooms.ensure_room_exists(room_id).await?;

        self.repository
            .get_message(room_id, message_id)
            .await?
            .map(MessageResponse::from)
            .ok_or_else(|| AppError::NotFound("message not found".to_string()))
    }

    #[instrument(skip(self))]
    pub async fn react(
        &self,
        room_id: Uuid,
        message_id: Uuid,
    ) -> Result<ReactionCountResponse, AppError> {
        self.ensure_message_exists(room_id, message_id).await?;

        let count = self.repository.increment_reaction(message_id).await?;
        self.publisher.dispatch(Event::reaction_increased(
            room_id,
            message_id.to_string(),
            count,
        ));

        Ok(ReactionCountResponse { count })
    }

    #[instrument(skip(self))]
    pub async fn remove_reaction(
        &self,
        room_id: Uuid,
        message_id: Uuid,
    ) -> Result<ReactionCountResponse, AppError> {
        self.ensure_message_exists(room_id, message_id).await?;

        let count = self.repository.decrement_reaction(message_id).await?;
        self.publisher.dispatch(Event::reaction_decreased(
            room_id,
            message_id.to_string(),
            count,
        ));

        Ok(ReactionCountResponse { count })
    }

    #[instrument(skip(self))]
    pub async fn mark_answered(&self, room_id: Uuid, message_id: Uuid) -> Result<(), AppError> {
        self.ensure_message_exists(room_id, message_id).await?;

        self.repository.mark_answered(message_id).await?;
        self.publisher
            .dispatch(Event::message_answered(room_id, message_id.to_string()));

        Ok(())
    }
}
