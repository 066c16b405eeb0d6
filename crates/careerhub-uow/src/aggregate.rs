//! Aggregate trait and per-entity event queues.

use uuid::Uuid;

use careerhub_core::events::{DomainEvent, EventPayload};

/// Two-phase event queues embedded in every aggregate.
///
/// Before-commit events are published inside the transaction and can
/// veto it; after-commit events are published only once the
/// transaction is durable.
#[derive(Debug, Clone, Default)]
pub struct EventQueues {
    before_commit: Vec<DomainEvent>,
    after_commit: Vec<DomainEvent>,
}

impl EventQueues {
    /// Create empty queues.
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise an event to be published inside the transaction.
    pub fn record_before_commit(&mut self, payload: EventPayload) {
        self.before_commit.push(DomainEvent::new(payload));
    }

    /// Raise an event to be published after the transaction commits.
    pub fn record_after_commit(&mut self, payload: EventPayload) {
        self.after_commit.push(DomainEvent::new(payload));
    }

    /// Remove and return both queues.
    pub fn drain(&mut self) -> (Vec<DomainEvent>, Vec<DomainEvent>) {
        (
            std::mem::take(&mut self.before_commit),
            std::mem::take(&mut self.after_commit),
        )
    }

    /// Whether any events are queued.
    pub fn is_empty(&self) -> bool {
        self.before_commit.is_empty() && self.after_commit.is_empty()
    }
}

/// An entity that participates in the unit of work.
///
/// Aggregates raise events via their embedded [`EventQueues`]; the
/// tracked repository drains them into the shared ledger when the
/// aggregate is persisted.
pub trait Aggregate: Send + Sync + 'static {
    /// The aggregate's identity.
    fn id(&self) -> Uuid;

    /// Mutable access to the aggregate's event queues.
    fn events_mut(&mut self) -> &mut EventQueues;
}
