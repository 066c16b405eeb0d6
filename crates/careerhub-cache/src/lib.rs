//! # careerhub-cache
//!
//! Key-value store backends for CareerHub: a Redis implementation over
//! `redis::aio::ConnectionManager` and an in-memory implementation for
//! tests and single-node deployments. Also home to the distributed lock
//! built on top of the store trait, and the key builders.

pub mod keys;
pub mod lock;
pub mod memory;
pub mod redis_backend;

pub use lock::DistributedLock;
pub use memory::MemoryStore;
pub use redis_backend::{RedisClient, RedisStore};
