//! Notification entity and status enumeration.

pub mod model;
pub mod status;

pub use model::{CreateNotification, NotificationRecord};
pub use status::NotificationStatus;
