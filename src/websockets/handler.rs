use axum::{
    extract::{ws::WebSocket, Path, State, WebSocketUpgrade},
    response::Response,
};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::session::Session;
use super::socket::split_socket;
use crate::event::SubscriberRegistry;
use crate::room::RoomService;
use crate::shared::{AppError, AppState};

/// WebSocket endpoint streaming live updates for one room
///
/// GET /v1/subscribe/{room_id}
/// The room is checked before the upgrade, so an unknown room is a 404 even for a
/// request that could not be upgraded.
#[instrument(name = "subscribe", skip(ws, state))]
pub async fn subscribe(
    Path(room_id): Path<Uuid>,
    State(state): State<AppState>,
    ws: Option<WebSocketUpgrade>,
) -> Result<Response, AppError> {
    info!(room_id = %room_id, "WebSocket connection requested");

    let service = RoomService::new(Arc::clone(&state.room_repository));
    service.ensure_room_exists(room_id).await?;

    let Some(ws) = ws else {
        warn!(room_id = %room_id, "Request is not a valid WebSocket upgrade");
        return Err(AppError::BadRequest(
            "failed to upgrade connection".to_string(),
        ));
    };

    let registry = Arc::clone(state.publisher.registry());

    Ok(ws
        .on_failed_upgrade(move |e| {
            warn!(room_id = %room_id, error = %e, "Failed to upgrade connection");
        })
        .on_upgrade(move |socket| handle_subscriber_connection(socket, room_id, registry)))
}

/// Runs a subscriber session over the upgraded WebSocket
async fn handle_subscriber_connection(
    socket: WebSocket,
    room_id: Uuid,
    registry: Arc<SubscriberRegistry>,
) {
    let (outbound, inbound) = split_socket(socket);
    let session = Session::new(registry, room_id);
    let connection_id = session.connection_id();

    let state = session.start(outbound, Box::new(inbound)).await;

    info!(
        room_id = %room_id,
        connection_id = %connection_id,
        state = %state,
        "Subscriber session finished"
    );
}
