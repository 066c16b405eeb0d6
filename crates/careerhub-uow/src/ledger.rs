//! Shared two-phase event ledger.

use std::sync::{Arc, Mutex};

use careerhub_core::events::DomainEvent;

use crate::aggregate::EventQueues;

/// Collects events drained from aggregates during one unit of work.
///
/// All tracked repositories created by a unit of work share one
/// ledger, so events from every persisted aggregate end up in the same
/// two publication phases. Rolling back clears the ledger; an aborted
/// transaction never leaks an event.
#[derive(Debug, Default)]
pub struct EventLedger {
    before_commit: Vec<DomainEvent>,
    after_commit: Vec<DomainEvent>,
}

/// Ledger handle shared between a unit of work and its repositories.
pub type SharedLedger = Arc<Mutex<EventLedger>>;

impl EventLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a shared handle to an empty ledger.
    pub fn shared() -> SharedLedger {
        Arc::new(Mutex::new(Self::new()))
    }

    /// Move all events out of an aggregate's queues into the ledger.
    pub fn absorb(&mut self, queues: &mut EventQueues) {
        let (before, after) = queues.drain();
        self.before_commit.extend(before);
        self.after_commit.extend(after);
    }

    /// Remove and return the before-commit events.
    pub fn take_before_commit(&mut self) -> Vec<DomainEvent> {
        std::mem::take(&mut self.before_commit)
    }

    /// Remove and return the after-commit events.
    pub fn take_after_commit(&mut self) -> Vec<DomainEvent> {
        std::mem::take(&mut self.after_commit)
    }

    /// Discard all collected events.
    pub fn clear(&mut self) {
        self.before_commit.clear();
        self.after_commit.clear();
    }

    /// Whether any events are collected.
    pub fn is_empty(&self) -> bool {
        self.before_commit.is_empty() && self.after_commit.is_empty()
    }
}
