//! Notification lifecycle events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::NotificationChannel;

/// Events related to notification delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum NotificationEvent {
    /// A notification was created and enqueued for delivery.
    Queued {
        /// The notification ID.
        notification_id: Uuid,
        /// The delivery channel.
        channel: NotificationChannel,
        /// The recipient address or identifier.
        recipient: String,
    },
    /// A notification was scheduled for future delivery.
    Scheduled {
        /// The notification ID.
        notification_id: Uuid,
        /// When the notification becomes due.
        scheduled_at: DateTime<Utc>,
    },
    /// A notification was delivered to its channel provider.
    Sent {
        /// The notification ID.
        notification_id: Uuid,
        /// The delivery channel.
        channel: NotificationChannel,
        /// How many attempts delivery took.
        attempts: u32,
    },
    /// A notification exhausted its delivery attempts.
    Failed {
        /// The notification ID.
        notification_id: Uuid,
        /// The delivery channel.
        channel: NotificationChannel,
        /// The final error message.
        reason: String,
    },
}

impl NotificationEvent {
    /// The routing tag handlers subscribe on.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Queued { .. } => "notification.queued",
            Self::Scheduled { .. } => "notification.scheduled",
            Self::Sent { .. } => "notification.sent",
            Self::Failed { .. } => "notification.failed",
        }
    }
}
