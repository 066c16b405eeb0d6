//! Core traits defined in `careerhub-core` and implemented by other crates.

pub mod events;
pub mod kv;
pub mod provider;

pub use events::{EventBus, EventHandler};
pub use kv::KeyValueStore;
pub use provider::{ChannelProvider, DeliveryRequest};
