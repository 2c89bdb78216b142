// Public API - what other modules can use
pub use handlers::{
    create_message, get_message, list_messages, mark_message_answered, react_to_message,
    remove_reaction,
};
pub use repository::{InMemoryMessageRepository, MessageRepository, PostgresMessageRepository};
pub use service::MessageService;

// Internal modules
mod handlers;
pub mod models;
pub mod repository;
mod service;
pub mod types;
