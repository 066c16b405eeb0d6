//! Notification repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use careerhub_core::error::{AppError, ErrorKind};
use careerhub_core::result::AppResult;
use careerhub_entity::notification::{CreateNotification, NotificationRecord};

use crate::stores::NotificationStore;

/// Repository for notification record CRUD and sweep queries.
#[derive(Debug, Clone)]
pub struct NotificationRepository {
    pool: PgPool,
}

impl NotificationRepository {
    /// Create a new notification repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationStore for NotificationRepository {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<NotificationRecord>> {
        sqlx::query_as::<_, NotificationRecord>("SELECT * FROM notifications WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find notification", e)
            })
    }

    async fn create(&self, data: &CreateNotification) -> AppResult<NotificationRecord> {
        sqlx::query_as::<_, NotificationRecord>(
            "INSERT INTO notifications \
             (recipient, channel, title, message, html_content, kind, metadata, status, scheduled_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING *",
        )
        .bind(&data.recipient)
        .bind(data.channel)
        .bind(&data.title)
        .bind(&data.message)
        .bind(&data.html_content)
        .bind(&data.kind)
        .bind(&data.metadata)
        .bind(data.status)
        .bind(data.scheduled_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to create notification", e)
        })
    }

    async fn mark_sent(&self, id: Uuid, sent_at: DateTime<Utc>) -> AppResult<()> {
        sqlx::query("UPDATE notifications SET status = 'sent', sent_at = $2 WHERE id = $1")
            .bind(id)
            .bind(sent_at)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to mark notification sent", e)
            })?;
        Ok(())
    }

    async fn mark_failed(&self, id: Uuid) -> AppResult<()> {
        sqlx::query("UPDATE notifications SET status = 'failed' WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to mark notification failed", e)
            })?;
        Ok(())
    }

    async fn mark_read(&self, id: Uuid) -> AppResult<()> {
        sqlx::query("UPDATE notifications SET status = 'read' WHERE id = $1 AND status = 'sent'")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to mark notification read", e)
            })?;
        Ok(())
    }

    async fn find_due_scheduled(
        &self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> AppResult<Vec<NotificationRecord>> {
        sqlx::query_as::<_, NotificationRecord>(
            "SELECT * FROM notifications \
             WHERE status = 'scheduled' AND scheduled_at <= $1 \
             ORDER BY scheduled_at ASC \
             LIMIT $2",
        )
        .bind(now)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to find due notifications", e)
        })
    }

    async fn delete_terminal_before(&self, cutoff: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query(
            "DELETE FROM notifications \
             WHERE status IN ('sent', 'read', 'failed') AND created_at < $1",
        )
        .bind(cutoff)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to purge old notifications", e)
        })?;
        Ok(result.rows_affected())
    }
}
