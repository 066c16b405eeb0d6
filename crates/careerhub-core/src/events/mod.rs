//! Domain events emitted by CareerHub operations.
//!
//! Events are collected on aggregates during a unit of work and
//! dispatched through the event bus either before or after the
//! transaction commits, depending on the handler's registration.

pub mod notification;
pub mod recruiting;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use notification::NotificationEvent;
pub use recruiting::RecruitingEvent;

/// Wrapper for all domain events with metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainEvent {
    /// Unique event ID.
    pub id: Uuid,
    /// When the event occurred.
    pub occurred_at: DateTime<Utc>,
    /// The event payload.
    pub payload: EventPayload,
}

/// Union of all domain event types.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "domain", content = "event")]
pub enum EventPayload {
    /// A notification lifecycle event.
    Notification(NotificationEvent),
    /// A recruiting workflow event.
    Recruiting(RecruitingEvent),
}

impl DomainEvent {
    /// Create a new domain event.
    pub fn new(payload: EventPayload) -> Self {
        Self {
            id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            payload,
        }
    }

    /// The routing tag handlers subscribe on.
    pub fn tag(&self) -> &'static str {
        self.payload.tag()
    }
}

impl EventPayload {
    /// The routing tag for this payload.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Notification(e) => e.tag(),
            Self::Recruiting(e) => e.tag(),
        }
    }
}
