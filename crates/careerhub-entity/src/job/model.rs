//! Queue job entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::state::JobState;

/// A notification delivery job as stored in the queue table.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct QueuedJob {
    /// Unique job identifier.
    pub id: Uuid,
    /// The notification payload (JSONB).
    pub payload: serde_json::Value,
    /// Current job state.
    pub state: JobState,
    /// Number of delivery attempts so far.
    pub attempts: i32,
    /// Maximum allowed attempts.
    pub max_attempts: i32,
    /// Base delay in milliseconds for exponential retry backoff.
    pub backoff_base_ms: i64,
    /// When the job becomes claimable.
    pub run_at: DateTime<Utc>,
    /// Error message from the most recent failed attempt.
    pub last_error: Option<String>,
    /// Worker ID that claimed the job.
    pub worker_id: Option<String>,
    /// When the job was created.
    pub created_at: DateTime<Utc>,
    /// When the job was last updated.
    pub updated_at: DateTime<Utc>,
    /// When the job reached a terminal state.
    pub completed_at: Option<DateTime<Utc>>,
}

impl QueuedJob {
    /// Check if the job has attempts remaining.
    pub fn can_retry(&self) -> bool {
        self.attempts < self.max_attempts
    }

    /// Delay before the next attempt: `backoff_base_ms * 2^(attempts-1)`.
    pub fn next_backoff_ms(&self) -> i64 {
        let exponent = self.attempts.saturating_sub(1).min(30) as u32;
        self.backoff_base_ms.saturating_mul(1i64 << exponent)
    }
}

/// Data required to enqueue a new job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateQueuedJob {
    /// The notification payload.
    pub payload: serde_json::Value,
    /// Maximum retry attempts.
    pub max_attempts: i32,
    /// Base backoff delay in milliseconds.
    pub backoff_base_ms: i64,
    /// When the job becomes claimable.
    pub run_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job_with_attempts(attempts: i32) -> QueuedJob {
        QueuedJob {
            id: Uuid::new_v4(),
            payload: serde_json::json!({}),
            state: JobState::Waiting,
            attempts,
            max_attempts: 3,
            backoff_base_ms: 2000,
            run_at: Utc::now(),
            last_error: None,
            worker_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            completed_at: None,
        }
    }

    #[test]
    fn test_backoff_doubles_per_attempt() {
        assert_eq!(job_with_attempts(1).next_backoff_ms(), 2000);
        assert_eq!(job_with_attempts(2).next_backoff_ms(), 4000);
        assert_eq!(job_with_attempts(3).next_backoff_ms(), 8000);
    }

    #[test]
    fn test_retry_exhaustion() {
        assert!(job_with_attempts(2).can_retry());
        assert!(!job_with_attempts(3).can_retry());
    }
}
