//! Notification entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use careerhub_core::types::NotificationChannel;

use super::status::NotificationStatus;

/// A notification to be delivered to a recipient over one channel.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct NotificationRecord {
    /// Unique notification identifier.
    pub id: Uuid,
    /// Recipient address or identifier (email address, phone number,
    /// user ID for websocket/push).
    pub recipient: String,
    /// Delivery channel.
    pub channel: NotificationChannel,
    /// Short title / subject line.
    pub title: String,
    /// Plain-text body.
    pub message: String,
    /// Optional HTML body (email only).
    pub html_content: Option<String>,
    /// Semantic category (e.g., `"job-recommendation"`, `"application-update"`).
    pub kind: Option<String>,
    /// Additional structured data (JSON).
    pub metadata: Option<serde_json::Value>,
    /// Current lifecycle status.
    pub status: NotificationStatus,
    /// When the notification becomes due (None = immediate).
    pub scheduled_at: Option<DateTime<Utc>>,
    /// When the notification was delivered.
    pub sent_at: Option<DateTime<Utc>>,
    /// When the notification was created.
    pub created_at: DateTime<Utc>,
}

impl NotificationRecord {
    /// Check if the notification is due for promotion to the queue.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.status == NotificationStatus::Scheduled
            && self.scheduled_at.map(|at| at <= now).unwrap_or(false)
    }
}

/// Data required to create a new notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateNotification {
    /// Recipient address or identifier.
    pub recipient: String,
    /// Delivery channel.
    pub channel: NotificationChannel,
    /// Short title / subject line.
    pub title: String,
    /// Plain-text body.
    pub message: String,
    /// Optional HTML body.
    pub html_content: Option<String>,
    /// Semantic category.
    pub kind: Option<String>,
    /// Additional structured data.
    pub metadata: Option<serde_json::Value>,
    /// Initial status.
    pub status: NotificationStatus,
    /// When the notification becomes due.
    pub scheduled_at: Option<DateTime<Utc>>,
}
