//! # careerhub-notify
//!
//! Delivery channel providers for CareerHub notifications: SMTP email,
//! SMS and push over HTTP gateways, and an in-process websocket hub.
//! The [`router::ProviderRouter`] maps a channel to its provider.

pub mod providers;
pub mod router;

pub use providers::{PushProvider, SmsProvider, SmtpEmailProvider, WebsocketHub, WebsocketProvider};
pub use router::ProviderRouter;
