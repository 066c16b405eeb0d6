//! Shared types used across CareerHub crates.

pub mod channel;

pub use channel::NotificationChannel;
