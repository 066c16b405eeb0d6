//! Notification job wire payload.
//!
//! This is the JSON contract between producers and the job processor.
//! Field names are camelCase on the wire.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use careerhub_core::types::NotificationChannel;

use crate::notification::NotificationRecord;

/// Payload of a single notification delivery job.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationJob {
    /// Recipient address or identifier.
    pub recipient: String,
    /// Delivery channel.
    pub channel: NotificationChannel,
    /// Short title / subject line.
    pub title: String,
    /// Plain-text body.
    pub message: String,
    /// Optional HTML body (email only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html_content: Option<String>,
    /// Semantic category (e.g., `"job-recommendation"`).
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Additional structured data forwarded to the channel.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
    /// Back-reference to an already-persisted notification. Set by the
    /// sweeper when promoting scheduled records; absent for ad-hoc jobs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification_id: Option<Uuid>,
}

impl From<&NotificationRecord> for NotificationJob {
    fn from(record: &NotificationRecord) -> Self {
        Self {
            recipient: record.recipient.clone(),
            channel: record.channel,
            title: record.title.clone(),
            message: record.message.clone(),
            html_content: record.html_content.clone(),
            kind: record.kind.clone(),
            metadata: record.metadata.clone(),
            notification_id: Some(record.id),
        }
    }
}
