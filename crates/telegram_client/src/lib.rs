//! Telegram Bot API client library.
//!
//! Provides the outbound send/upload calls and the inbound long-poll used by
//! the command listener.

pub mod rate_limit;
pub mod rest;

pub use rate_limit::RateLimiter;
pub use rest::TelegramClient;
