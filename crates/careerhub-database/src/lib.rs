//! # careerhub-database
//!
//! PostgreSQL connection management, store traits, and concrete
//! repository implementations for the CareerHub notification subsystem.

pub mod connection;
pub mod migration;
pub mod repositories;
pub mod stores;

pub use connection::DatabasePool;
pub use stores::{JobCounts, JobStore, NotificationStore};
