// Public API
pub use handler::subscribe;
pub use session::{Session, SessionState};
pub use socket::{split_socket, InboundSocket, OutboundSocket, SocketError, WebSocketSender};

// Internal modules
mod handler;
mod session;
mod socket;
