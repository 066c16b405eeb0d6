//! Channel provider implementations.

pub mod email;
pub mod push;
pub mod sms;
pub mod websocket;

pub use email::SmtpEmailProvider;
pub use push::PushProvider;
pub use sms::SmsProvider;
pub use websocket::{WebsocketHub, WebsocketProvider};
