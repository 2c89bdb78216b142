use axum::{
    http::{header, HeaderName, Method},
    routing::{get, patch},
    Router,
};
use std::time::Duration;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::{message, room, shared::AppState, websockets};

/// Builds the HTTP router with all `/v1` routes, tracing and CORS
pub fn build_router(state: AppState) -> Router {
    // Collections answer with and without a trailing slash
    let rooms = get(room::list_rooms).post(room::create_room);
    let messages = get(message::list_messages).post(message::create_message);

    let v1 = Router::new()
        .route("/subscribe/:room_id", get(websockets::subscribe))
        .route("/rooms", rooms.clone())
        .route("/rooms/", rooms)
        .route("/rooms/:room_id", get(room::get_room))
        .route("/rooms/:room_id/messages", messages.clone())
        .route("/rooms/:room_id/messages/", messages)
        .route(
            "/rooms/:room_id/messages/:message_id",
            get(message::get_message),
        )
        .route(
            "/rooms/:room_id/messages/:message_id/react",
            patch(message::react_to_message).delete(message::remove_reaction),
        )
        .route(
            "/rooms/:room_id/messages/:message_id/answer",
            patch(message::mark_message_answered),
        );

    Router::new()
        .nest("/v1", v1)
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Any http(s) origin may call the API; credentials are not allowed
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
            Method::PATCH,
        ])
        .allow_headers([
            header::ACCEPT,
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            HeaderName::from_static("x-csrf-token"),
        ])
        .expose_headers([header::LINK])
        .max_age(Duration::from_secs(300))
}
