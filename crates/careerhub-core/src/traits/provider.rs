//! Channel provider trait for pluggable delivery backends.

use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use crate::result::AppResult;
use crate::types::NotificationChannel;

/// A single delivery handed to a channel provider.
#[derive(Debug, Clone)]
pub struct DeliveryRequest {
    /// The notification being delivered, if it is persisted.
    pub notification_id: Option<Uuid>,
    /// Recipient address or identifier (email address, phone number,
    /// user ID for websocket/push).
    pub recipient: String,
    /// Short title / subject line.
    pub title: String,
    /// Plain-text body.
    pub message: String,
    /// Optional HTML body (email only).
    pub html_content: Option<String>,
    /// Optional structured metadata forwarded to the channel.
    pub metadata: Option<Value>,
}

/// Trait for delivery channel backends (SMTP, SMS gateway, websocket
/// hub, push gateway).
///
/// Providers classify their own failures: a [`crate::ErrorKind::Provider`]
/// error is permanent and never retried, anything else is retried with
/// backoff.
#[async_trait]
pub trait ChannelProvider: Send + Sync + 'static {
    /// The channel this provider serves.
    fn channel(&self) -> NotificationChannel;

    /// Human-readable provider name for logging.
    fn name(&self) -> &'static str;

    /// Deliver a single notification.
    async fn send(&self, request: &DeliveryRequest) -> AppResult<()>;
}
