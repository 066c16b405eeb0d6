//! Recruiting workflow events.
//!
//! Emitted by aggregates during a unit of work and typically consumed
//! by handlers that fan out notifications to interested users.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Events related to the recruiting workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RecruitingEvent {
    /// A job posting went live.
    JobPostingPublished {
        /// The job posting ID.
        job_posting_id: Uuid,
        /// The employer who published it.
        employer_id: Uuid,
        /// The posting title.
        title: String,
    },
    /// A candidate submitted an application.
    ApplicationSubmitted {
        /// The application ID.
        application_id: Uuid,
        /// The job posting applied to.
        job_posting_id: Uuid,
        /// The candidate who applied.
        candidate_id: Uuid,
    },
    /// An application moved to a new status.
    ApplicationStatusChanged {
        /// The application ID.
        application_id: Uuid,
        /// The candidate who owns the application.
        candidate_id: Uuid,
        /// The previous status.
        from_status: String,
        /// The new status.
        to_status: String,
    },
}

impl RecruitingEvent {
    /// The routing tag handlers subscribe on.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::JobPostingPublished { .. } => "recruiting.job_posting.published",
            Self::ApplicationSubmitted { .. } => "recruiting.application.submitted",
            Self::ApplicationStatusChanged { .. } => "recruiting.application.status_changed",
        }
    }
}
