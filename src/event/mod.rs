// Live-update fan-out
//
// Events describe changes to messages, the registry tracks which connections are
// listening to which room, and the publisher pushes events to them.

// Public API - what other modules can use
pub use events::{Event, EventKind, EventPayload};
pub use publisher::Publisher;
pub use registry::{ConnectionId, SubscriberRegistry, Subscription};

// Internal modules
mod events;
mod publisher;
mod registry;
