//! Delivery job queue repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use careerhub_core::error::{AppError, ErrorKind};
use careerhub_core::result::AppResult;
use careerhub_entity::job::{CreateQueuedJob, JobState, QueuedJob};

use crate::stores::{JobCounts, JobStore};

/// Repository for the notification delivery job queue.
#[derive(Debug, Clone)]
pub struct JobRepository {
    pool: PgPool,
}

impl JobRepository {
    /// Create a new job repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobStore for JobRepository {
    async fn enqueue(&self, data: &CreateQueuedJob) -> AppResult<QueuedJob> {
        sqlx::query_as::<_, QueuedJob>(
            "INSERT INTO notification_jobs (payload, state, max_attempts, backoff_base_ms, run_at) \
             VALUES ($1, CASE WHEN $4 <= NOW() THEN 'waiting'::job_state ELSE 'delayed'::job_state END, $2, $3, $4) \
             RETURNING *",
        )
        .bind(&data.payload)
        .bind(data.max_attempts)
        .bind(data.backoff_base_ms)
        .bind(data.run_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to enqueue job", e))
    }

    async fn enqueue_many(&self, data: &[CreateQueuedJob]) -> AppResult<u64> {
        if data.is_empty() {
            return Ok(0);
        }

        let payloads: Vec<serde_json::Value> = data.iter().map(|d| d.payload.clone()).collect();
        let max_attempts: Vec<i32> = data.iter().map(|d| d.max_attempts).collect();
        let backoffs: Vec<i64> = data.iter().map(|d| d.backoff_base_ms).collect();
        let run_ats: Vec<DateTime<Utc>> = data.iter().map(|d| d.run_at).collect();

        let result = sqlx::query(
            "INSERT INTO notification_jobs (payload, state, max_attempts, backoff_base_ms, run_at) \
             SELECT p, CASE WHEN r <= NOW() THEN 'waiting'::job_state ELSE 'delayed'::job_state END, m, b, r \
             FROM UNNEST($1::jsonb[], $2::int[], $3::bigint[], $4::timestamptz[]) AS t(p, m, b, r)",
        )
        .bind(&payloads)
        .bind(&max_attempts)
        .bind(&backoffs)
        .bind(&run_ats)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to enqueue job batch", e))?;

        Ok(result.rows_affected())
    }

    async fn claim_next(&self, worker_id: &str) -> AppResult<Option<QueuedJob>> {
        sqlx::query_as::<_, QueuedJob>(
            "UPDATE notification_jobs SET state = 'active', attempts = attempts + 1, \
             worker_id = $1, updated_at = NOW() \
             WHERE id = ( \
                SELECT id FROM notification_jobs \
                WHERE state IN ('waiting', 'delayed') AND run_at <= NOW() \
                ORDER BY run_at ASC, created_at ASC \
                FOR UPDATE SKIP LOCKED \
                LIMIT 1 \
             ) RETURNING *",
        )
        .bind(worker_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to claim job", e))
    }

    async fn mark_completed(&self, id: Uuid) -> AppResult<()> {
        sqlx::query(
            "UPDATE notification_jobs SET state = 'completed', completed_at = NOW(), \
             updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to complete job", e))?;
        Ok(())
    }

    async fn mark_failed(&self, id: Uuid, error: &str) -> AppResult<()> {
        sqlx::query(
            "UPDATE notification_jobs SET state = 'failed', last_error = $2, \
             completed_at = NOW(), updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(error)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to mark job failed", e))?;
        Ok(())
    }

    async fn reschedule(&self, id: Uuid, run_at: DateTime<Utc>, error: &str) -> AppResult<()> {
        sqlx::query(
            "UPDATE notification_jobs SET state = 'delayed', run_at = $2, last_error = $3, \
             worker_id = NULL, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(run_at)
        .bind(error)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to reschedule job", e))?;
        Ok(())
    }

    async fn counts_by_state(&self) -> AppResult<JobCounts> {
        let rows: Vec<(JobState, i64)> = sqlx::query_as(
            "SELECT state, COUNT(*) FROM notification_jobs GROUP BY state",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to count jobs", e))?;

        let mut counts = JobCounts::default();
        for (state, count) in rows {
            match state {
                JobState::Waiting => counts.waiting = count,
                JobState::Delayed => counts.delayed = count,
                JobState::Active => counts.active = count,
                JobState::Completed => counts.completed = count,
                JobState::Failed => counts.failed = count,
            }
        }
        Ok(counts)
    }

    async fn purge_completed(
        &self,
        older_than: DateTime<Utc>,
        keep_count: i64,
    ) -> AppResult<u64> {
        let by_age = sqlx::query(
            "DELETE FROM notification_jobs WHERE state = 'completed' AND completed_at < $1",
        )
        .bind(older_than)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to purge completed jobs", e)
        })?;

        // Trim anything beyond the newest keep_count, regardless of age.
        let by_count = sqlx::query(
            "DELETE FROM notification_jobs WHERE state = 'completed' AND id NOT IN ( \
                SELECT id FROM notification_jobs WHERE state = 'completed' \
                ORDER BY completed_at DESC LIMIT $1 \
             )",
        )
        .bind(keep_count)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to trim completed jobs", e)
        })?;

        Ok(by_age.rows_affected() + by_count.rows_affected())
    }

    async fn purge_failed(&self, older_than: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query(
            "DELETE FROM notification_jobs WHERE state = 'failed' AND completed_at < $1",
        )
        .bind(older_than)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to purge failed jobs", e)
        })?;
        Ok(result.rows_affected())
    }
}
