//! Collaborator seams between the alerting engine and the outside world.

use std::path::Path;

use async_trait::async_trait;

use crate::{Result, Update};

/// Source of volatility readings, queried once per poll cycle.
#[async_trait]
pub trait VolatilitySource: Send + Sync {
    async fn fetch(&self) -> Result<Vec<crate::VolatilityRecord>>;
}

/// Outbound and inbound operations against the chat platform.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send_message(&self, chat_id: &str, text: &str, reply_to: Option<i64>) -> Result<()>;

    /// Upload a local file as a document.
    async fn send_document(&self, chat_id: &str, path: &Path) -> Result<()>;

    /// Long-poll for updates starting at `offset`.
    async fn get_updates(&self, offset: Option<i64>, timeout_secs: u64) -> Result<Vec<Update>>;

    /// Drop any server-side push (webhook) registration.
    async fn delete_webhook(&self) -> Result<()>;
}
