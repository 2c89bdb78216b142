pub mod mocks;
pub mod setup;

// Re-export main utilities for use by test files
#[allow(unused_imports)]
pub use mocks::{MockInboundSocket, MockOutboundSocket};
#[allow(unused_imports)]
pub use setup::{wait_for_frames, wait_for_subscribers, TestRoom};
