// Library crate for the ask-me-anything server
// This file exposes the public API for integration tests

pub mod config;
pub mod event;
pub mod message;
pub mod room;
pub mod routes;
pub mod shared;
pub mod websockets;

// Re-export commonly used types for easier access in tests
pub use config::Config;
pub use event::{Event, EventKind, EventPayload, Publisher, SubscriberRegistry};
pub use routes::build_router;
pub use shared::{AppError, AppState};
pub use websockets::{InboundSocket, OutboundSocket, Session, SessionState, SocketError};
