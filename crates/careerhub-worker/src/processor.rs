//! Notification job processor.
//!
//! Takes a wire payload claimed from the queue, resolves or creates
//! the notification record, and hands the delivery to the channel
//! provider. The record is durable before any provider is contacted.

use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info, warn};
use uuid::Uuid;

use careerhub_core::error::AppError;
use careerhub_core::result::AppResult;
use careerhub_core::traits::provider::DeliveryRequest;
use careerhub_database::stores::NotificationStore;
use careerhub_entity::job::NotificationJob;
use careerhub_entity::notification::{CreateNotification, NotificationStatus};
use careerhub_notify::ProviderRouter;

/// Processes one notification delivery job.
pub struct NotificationProcessor {
    notifications: Arc<dyn NotificationStore>,
    router: Arc<ProviderRouter>,
}

impl NotificationProcessor {
    /// Create a new processor.
    pub fn new(notifications: Arc<dyn NotificationStore>, router: Arc<ProviderRouter>) -> Self {
        Self {
            notifications,
            router,
        }
    }

    /// Deliver one notification. Returns the notification record's ID.
    ///
    /// Payloads carrying a `notification_id` reference a persisted
    /// record; a dangling reference is a hard error. Payloads without
    /// one get a record created first, so the notification is durable
    /// before dispatch. Records that are already `Sent` or `Read` are
    /// skipped, which makes redelivery of a retried job idempotent.
    pub async fn process(&self, job: &NotificationJob) -> AppResult<Uuid> {
        let record = match job.notification_id {
            Some(id) => self
                .notifications
                .find_by_id(id)
                .await?
                .ok_or_else(|| {
                    AppError::not_found(format!("Notification {id} referenced by job is missing"))
                })?,
            None => {
                self.notifications
                    .create(&CreateNotification {
                        recipient: job.recipient.clone(),
                        channel: job.channel,
                        title: job.title.clone(),
                        message: job.message.clone(),
                        html_content: job.html_content.clone(),
                        kind: job.kind.clone(),
                        metadata: job.metadata.clone(),
                        status: NotificationStatus::Pending,
                        scheduled_at: None,
                    })
                    .await?
            }
        };

        // Sent and Read are both past delivery; Failed stays retryable.
        if matches!(
            record.status,
            NotificationStatus::Sent | NotificationStatus::Read
        ) {
            info!(notification_id = %record.id, "Notification already delivered, skipping");
            return Ok(record.id);
        }

        let provider = self.router.route(job.channel)?;

        let request = DeliveryRequest {
            notification_id: Some(record.id),
            recipient: job.recipient.clone(),
            title: job.title.clone(),
            message: job.message.clone(),
            html_content: job.html_content.clone(),
            metadata: job.metadata.clone(),
        };

        match provider.send(&request).await {
            Ok(()) => {
                self.notifications.mark_sent(record.id, Utc::now()).await?;
                info!(
                    notification_id = %record.id,
                    channel = %job.channel,
                    provider = provider.name(),
                    "Notification delivered"
                );
                Ok(record.id)
            }
            Err(e) => {
                warn!(
                    notification_id = %record.id,
                    channel = %job.channel,
                    error = %e,
                    "Notification delivery failed"
                );
                // Best effort; the dispatch error must not be masked.
                if let Err(persist_err) = self.notifications.mark_failed(record.id).await {
                    error!(
                        notification_id = %record.id,
                        error = %persist_err,
                        "Failed to mark notification as failed"
                    );
                }
                Err(e)
            }
        }
    }

    /// Record that the recipient has read a delivered notification.
    ///
    /// Only `Sent` records move to `Read`; anything else is left
    /// untouched, so a stray acknowledgement cannot revive a failed or
    /// pending record.
    pub async fn acknowledge_read(&self, notification_id: Uuid) -> AppResult<()> {
        self.notifications.mark_read(notification_id).await?;
        info!(%notification_id, "Notification acknowledged as read");
        Ok(())
    }
}
