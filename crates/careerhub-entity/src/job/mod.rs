//! Queue job entity, state enumeration, and wire payload.

pub mod model;
pub mod payload;
pub mod state;

pub use model::{CreateQueuedJob, QueuedJob};
pub use payload::NotificationJob;
pub use state::JobState;
