//! In-memory key-value store backend.

pub mod store;

pub use store::MemoryStore;
