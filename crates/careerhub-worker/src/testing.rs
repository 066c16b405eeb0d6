//! In-memory fakes shared by the worker crate's unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use careerhub_core::error::AppError;
use careerhub_core::result::AppResult;
use careerhub_core::traits::provider::{ChannelProvider, DeliveryRequest};
use careerhub_core::types::NotificationChannel;
use careerhub_database::stores::{JobCounts, JobStore, NotificationStore};
use careerhub_entity::job::{CreateQueuedJob, JobState, NotificationJob, QueuedJob};
use careerhub_entity::notification::{
    CreateNotification, NotificationRecord, NotificationStatus,
};

/// A minimal valid wire payload.
pub fn sample_job() -> NotificationJob {
    NotificationJob {
        recipient: "candidate@example.com".to_string(),
        channel: NotificationChannel::Email,
        title: "New job match".to_string(),
        message: "A new posting matches your profile".to_string(),
        html_content: None,
        kind: Some("job-recommendation".to_string()),
        metadata: None,
        notification_id: None,
    }
}

/// In-memory job store with the same claim semantics as Postgres.
#[derive(Debug, Default)]
pub struct InMemoryJobStore {
    rows: Mutex<Vec<QueuedJob>>,
    fail_enqueues: std::sync::atomic::AtomicBool,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn job(&self, id: Uuid) -> Option<QueuedJob> {
        self.rows.lock().unwrap().iter().find(|j| j.id == id).cloned()
    }

    pub fn all(&self) -> Vec<QueuedJob> {
        self.rows.lock().unwrap().clone()
    }

    /// Make subsequent `enqueue` calls fail (for sweep error paths).
    pub fn fail_enqueues(&self) {
        self.fail_enqueues.store(true, Ordering::SeqCst);
    }

    fn build(data: &CreateQueuedJob, now: DateTime<Utc>) -> QueuedJob {
        QueuedJob {
            id: Uuid::new_v4(),
            payload: data.payload.clone(),
            state: if data.run_at <= now {
                JobState::Waiting
            } else {
                JobState::Delayed
            },
            attempts: 0,
            max_attempts: data.max_attempts,
            backoff_base_ms: data.backoff_base_ms,
            run_at: data.run_at,
            last_error: None,
            worker_id: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }
}

#[async_trait]
impl JobStore for InMemoryJobStore {
    async fn enqueue(&self, data: &CreateQueuedJob) -> AppResult<QueuedJob> {
        if self.fail_enqueues.load(Ordering::SeqCst) {
            return Err(AppError::database("enqueue rejected"));
        }
        let job = Self::build(data, Utc::now());
        self.rows.lock().unwrap().push(job.clone());
        Ok(job)
    }

    async fn enqueue_many(&self, data: &[CreateQueuedJob]) -> AppResult<u64> {
        let now = Utc::now();
        let mut rows = self.rows.lock().unwrap();
        for item in data {
            rows.push(Self::build(item, now));
        }
        Ok(data.len() as u64)
    }

    async fn claim_next(&self, worker_id: &str) -> AppResult<Option<QueuedJob>> {
        let now = Utc::now();
        let mut rows = self.rows.lock().unwrap();

        let mut due: Vec<&mut QueuedJob> = rows
            .iter_mut()
            .filter(|j| {
                matches!(j.state, JobState::Waiting | JobState::Delayed) && j.run_at <= now
            })
            .collect();
        due.sort_by_key(|j| (j.run_at, j.created_at));

        let Some(job) = due.into_iter().next() else {
            return Ok(None);
        };
        job.state = JobState::Active;
        job.attempts += 1;
        job.worker_id = Some(worker_id.to_string());
        job.updated_at = now;
        Ok(Some(job.clone()))
    }

    async fn mark_completed(&self, id: Uuid) -> AppResult<()> {
        let mut rows = self.rows.lock().unwrap();
        let job = rows
            .iter_mut()
            .find(|j| j.id == id)
            .ok_or_else(|| AppError::not_found("job not found"))?;
        job.state = JobState::Completed;
        job.completed_at = Some(Utc::now());
        Ok(())
    }

    async fn mark_failed(&self, id: Uuid, error: &str) -> AppResult<()> {
        let mut rows = self.rows.lock().unwrap();
        let job = rows
            .iter_mut()
            .find(|j| j.id == id)
            .ok_or_else(|| AppError::not_found("job not found"))?;
        job.state = JobState::Failed;
        job.last_error = Some(error.to_string());
        job.completed_at = Some(Utc::now());
        Ok(())
    }

    async fn reschedule(&self, id: Uuid, run_at: DateTime<Utc>, error: &str) -> AppResult<()> {
        let mut rows = self.rows.lock().unwrap();
        let job = rows
            .iter_mut()
            .find(|j| j.id == id)
            .ok_or_else(|| AppError::not_found("job not found"))?;
        job.state = JobState::Delayed;
        job.run_at = run_at;
        job.last_error = Some(error.to_string());
        job.worker_id = None;
        Ok(())
    }

    async fn counts_by_state(&self) -> AppResult<JobCounts> {
        let rows = self.rows.lock().unwrap();
        let mut counts = JobCounts::default();
        for job in rows.iter() {
            match job.state {
                JobState::Waiting => counts.waiting += 1,
                JobState::Delayed => counts.delayed += 1,
                JobState::Active => counts.active += 1,
                JobState::Completed => counts.completed += 1,
                JobState::Failed => counts.failed += 1,
            }
        }
        Ok(counts)
    }

    async fn purge_completed(
        &self,
        older_than: DateTime<Utc>,
        keep_count: i64,
    ) -> AppResult<u64> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|j| {
            j.state != JobState::Completed || j.completed_at.map(|t| t >= older_than).unwrap_or(true)
        });

        let mut completed: Vec<(usize, DateTime<Utc>)> = rows
            .iter()
            .enumerate()
            .filter(|(_, j)| j.state == JobState::Completed)
            .map(|(i, j)| (i, j.completed_at.unwrap_or(j.updated_at)))
            .collect();
        completed.sort_by(|a, b| b.1.cmp(&a.1));
        let excess: Vec<usize> = completed
            .into_iter()
            .skip(keep_count as usize)
            .map(|(i, _)| i)
            .collect();
        let mut index = 0usize;
        rows.retain(|_| {
            let drop = excess.contains(&index);
            index += 1;
            !drop
        });

        Ok((before - rows.len()) as u64)
    }

    async fn purge_failed(&self, older_than: DateTime<Utc>) -> AppResult<u64> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|j| {
            j.state != JobState::Failed || j.completed_at.map(|t| t >= older_than).unwrap_or(true)
        });
        Ok((before - rows.len()) as u64)
    }
}

/// In-memory notification store.
#[derive(Debug, Default)]
pub struct InMemoryNotificationStore {
    rows: Mutex<Vec<NotificationRecord>>,
    fail_creates: std::sync::atomic::AtomicBool,
}

impl InMemoryNotificationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, id: Uuid) -> Option<NotificationRecord> {
        self.rows.lock().unwrap().iter().find(|r| r.id == id).cloned()
    }

    pub fn all(&self) -> Vec<NotificationRecord> {
        self.rows.lock().unwrap().clone()
    }

    pub fn seed(&self, record: NotificationRecord) {
        self.rows.lock().unwrap().push(record);
    }

    /// Make subsequent `create` calls fail (for sweep error paths).
    pub fn fail_creates(&self) {
        self.fail_creates.store(true, Ordering::SeqCst);
    }
}

/// Build a record directly, bypassing the store's create path.
pub fn seeded_record(
    status: NotificationStatus,
    scheduled_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
) -> NotificationRecord {
    NotificationRecord {
        id: Uuid::new_v4(),
        recipient: "candidate@example.com".to_string(),
        channel: NotificationChannel::Email,
        title: "Interview reminder".to_string(),
        message: "Your interview starts soon".to_string(),
        html_content: None,
        kind: None,
        metadata: None,
        status,
        scheduled_at,
        sent_at: None,
        created_at,
    }
}

#[async_trait]
impl NotificationStore for InMemoryNotificationStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<NotificationRecord>> {
        Ok(self.record(id))
    }

    async fn create(&self, data: &CreateNotification) -> AppResult<NotificationRecord> {
        if self.fail_creates.load(Ordering::SeqCst) {
            return Err(AppError::database("create rejected"));
        }
        let record = NotificationRecord {
            id: Uuid::new_v4(),
            recipient: data.recipient.clone(),
            channel: data.channel,
            title: data.title.clone(),
            message: data.message.clone(),
            html_content: data.html_content.clone(),
            kind: data.kind.clone(),
            metadata: data.metadata.clone(),
            status: data.status,
            scheduled_at: data.scheduled_at,
            sent_at: None,
            created_at: Utc::now(),
        };
        self.rows.lock().unwrap().push(record.clone());
        Ok(record)
    }

    async fn mark_sent(&self, id: Uuid, sent_at: DateTime<Utc>) -> AppResult<()> {
        let mut rows = self.rows.lock().unwrap();
        let record = rows
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| AppError::not_found("notification not found"))?;
        record.status = NotificationStatus::Sent;
        record.sent_at = Some(sent_at);
        Ok(())
    }

    async fn mark_failed(&self, id: Uuid) -> AppResult<()> {
        let mut rows = self.rows.lock().unwrap();
        let record = rows
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| AppError::not_found("notification not found"))?;
        record.status = NotificationStatus::Failed;
        Ok(())
    }

    async fn mark_read(&self, id: Uuid) -> AppResult<()> {
        let mut rows = self.rows.lock().unwrap();
        let record = rows
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| AppError::not_found("notification not found"))?;
        if record.status == NotificationStatus::Sent {
            record.status = NotificationStatus::Read;
        }
        Ok(())
    }

    async fn find_due_scheduled(
        &self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> AppResult<Vec<NotificationRecord>> {
        let rows = self.rows.lock().unwrap();
        let mut due: Vec<NotificationRecord> = rows
            .iter()
            .filter(|r| r.is_due(now))
            .cloned()
            .collect();
        due.sort_by_key(|r| r.scheduled_at);
        due.truncate(limit as usize);
        Ok(due)
    }

    async fn delete_terminal_before(&self, cutoff: DateTime<Utc>) -> AppResult<u64> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|r| !r.status.is_terminal() || r.created_at >= cutoff);
        Ok((before - rows.len()) as u64)
    }
}

/// Provider that records every delivery and never fails.
#[derive(Debug, Default)]
pub struct RecordingProvider {
    pub channel: Option<NotificationChannel>,
    pub sent: Mutex<Vec<DeliveryRequest>>,
}

impl RecordingProvider {
    pub fn email() -> Self {
        Self {
            channel: Some(NotificationChannel::Email),
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl ChannelProvider for RecordingProvider {
    fn channel(&self) -> NotificationChannel {
        self.channel.unwrap_or(NotificationChannel::Email)
    }

    fn name(&self) -> &'static str {
        "recording"
    }

    async fn send(&self, request: &DeliveryRequest) -> AppResult<()> {
        self.sent.lock().unwrap().push(request.clone());
        Ok(())
    }
}

/// Provider that always fails with a transient error.
#[derive(Debug, Default)]
pub struct AlwaysFailingProvider {
    pub attempts: AtomicUsize,
}

impl AlwaysFailingProvider {
    pub fn attempt_count(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChannelProvider for AlwaysFailingProvider {
    fn channel(&self) -> NotificationChannel {
        NotificationChannel::Email
    }

    fn name(&self) -> &'static str {
        "always-failing"
    }

    async fn send(&self, _request: &DeliveryRequest) -> AppResult<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(AppError::external_service("provider unavailable"))
    }
}
