//! Unified error type for the volatility bot.

use thiserror::Error;

/// Status code the Bot API returns when another consumer already holds the
/// update stream for this bot (a second poller or a registered webhook).
pub const CONFLICT_CODE: i64 = 409;

#[derive(Debug, Error)]
pub enum Error {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Coinglass API error: {0}")]
    Coinglass(String),

    #[error("Unexpected payload: {0}")]
    Payload(String),

    #[error("Telegram API error (code={code}): {description}")]
    TelegramApi { code: i64, description: String },

    #[error("Command already registered: {0}")]
    DuplicateCommand(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// True when the chat platform rejected a long poll because another
    /// listener is attached to the same bot identity.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Error::TelegramApi { code, .. } if *code == CONFLICT_CODE)
    }

    /// True for a missing file (e.g. the signal log has not been created yet).
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Io(e) if e.kind() == std::io::ErrorKind::NotFound)
    }
}
