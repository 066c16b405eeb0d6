//! # careerhub-uow
//!
//! Unit of work for CareerHub: aggregates raise domain events while
//! they are mutated, repositories capture those events into a shared
//! ledger at persistence time, and the unit of work publishes them in
//! two phases around the database transaction. Before-commit events
//! can veto the transaction; after-commit events run only once the
//! transaction is durable.

pub mod aggregate;
pub mod dispatcher;
pub mod driver;
pub mod ledger;
pub mod pg;
pub mod repository;
pub mod unit_of_work;

pub use aggregate::{Aggregate, EventQueues};
pub use dispatcher::EventDispatcher;
pub use driver::{IsolationLevel, TransactionDriver};
pub use ledger::{EventLedger, SharedLedger};
pub use pg::PgTransactionDriver;
pub use repository::{EntityStore, TrackedRepository};
pub use unit_of_work::UnitOfWork;
