use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use super::{
    service::MessageService,
    types::{CreateMessageRequest, CreateMessageResponse, MessageResponse, ReactionCountResponse},
};
use crate::shared::{AppError, AppState};

fn service(state: &AppState) -> MessageService {
    MessageService::new(
        Arc::clone(&state.room_repository),
        Arc::clone(&state.message_repository),
        state.publisher.clone(),
    )
}

/// POST /v1/rooms/{room_id}/messages
#[instrument(name = "create_message", skip(state))]
pub async fn create_message(
    State(state): State<AppState>,
    Path(room_id): Path<Uuid>,
    Json(request): Json<CreateMessageRequest>,
) -> Result<(StatusCode, Json<CreateMessageResponse>), AppError> {
    let message = service(&state).create_message(room_id, request).await?;

    Ok((StatusCode::CREATED, Json(message)))
}

/// GET /v1/rooms/{room_id}/messages
#[instrument(name = "list_messages", skip(state))]
pub async fn list_messages(
    State(state): State<AppState>,
    Path(room_id): Path<Uuid>,
) -> Result<Json<Vec<MessageResponse>>, AppError> {
    Ok(Json(service(&state).list_messages(room_id).await?))
}

/// GET /v1/rooms/{room_id}/messages/{message_id}
#[instrument(name = "get_message", skip(state))]
pub async fn get_message(
    State(state): State<AppState>,
    Path((room_id, message_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<MessageResponse>, AppError> {
    Ok(Json(service(&state).get_message(room_id, message_id).await?))
}

/// PATCH /v1/rooms/{room_id}/messages/{message_id}/react
#[instrument(name = "react_to_message", skip(state))]
pub async fn react_to_message(
    State(state): State<AppState>,
    Path((room_id, message_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<ReactionCountResponse>, AppError> {
    Ok(Json(service(&state).react(room_id, message_id).await?))
}

/// DELETE /v1/rooms/{room_id}/messages/{message_id}/react
#[instrument(name = "remove_reaction", skip(state))]
pub async fn remove_reaction(
    State(state): State<AppState>,
    Path((room_id, message_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<ReactionCountResponse>, AppError> {
    Ok(Json(
        service(&state).remove_reaction(room_id, message_id).await?,
    ))
}

/// PATCH /v1/rooms/{room_id}/messages/{message_id}/answer
#[instrument(name = "mark_message_answered", skip(state))]
pub async fn mark_message_answered(
    State(state): State<AppState>,
    Path((room_id, message_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, AppError> {
    service(&state).mark_answered(room_id, message_id).await?;

    Ok(StatusCode::OK)
}
