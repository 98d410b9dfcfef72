//! Outbound channel messages: alerts, announcements and the log upload.

use std::sync::Arc;

use common::ChatTransport;
use tracing::{debug, info, warn};

use crate::sink::SignalLog;

const STARTUP_ANNOUNCEMENT: &str =
    "✅ Bot started: volatility polling and command listener are running";
const STARTED_LOG_LINE: &str = "Bot started: command listener and poll loop running.";

/// Alert text for one qualifying reading.
pub fn format_alert(symbol: &str, volatility: f64) -> String {
    format!("⚡ {symbol}: volatility {volatility:.2}%")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadOutcome {
    Uploaded,
    /// No log file yet; not an error.
    Missing,
    Failed,
}

/// Sends to the single configured chat and mirrors every message into the
/// signal log. Send failures are logged, never returned.
#[derive(Clone)]
pub struct Notifier {
    transport: Arc<dyn ChatTransport>,
    chat_id: String,
    log: SignalLog,
}

impl Notifier {
    pub fn new(transport: Arc<dyn ChatTransport>, chat_id: impl Into<String>, log: SignalLog) -> Self {
        Self {
            transport,
            chat_id: chat_id.into(),
            log,
        }
    }

    /// Send one alert. Returns whether the platform accepted it.
    pub async fn notify(&self, symbol: &str, volatility: f64) -> bool {
        let text = format_alert(symbol, volatility);
        match self.transport.send_message(&self.chat_id, &text, None).await {
            Ok(()) => {
                info!("Alert sent: {} {:.2}%", symbol, volatility);
                self.log.append(&text);
                true
            }
            Err(e) => {
                warn!("Alert for {} not delivered: {}", symbol, e);
                self.log.append(&format!("Failed to send alert for {symbol}: {e}"));
                false
            }
        }
    }

    /// Send a free-form announcement (startup, daily reset).
    pub async fn announce(&self, text: &str) -> bool {
        match self.transport.send_message(&self.chat_id, text, None).await {
            Ok(()) => {
                self.log.append(text);
                true
            }
            Err(e) => {
                warn!("Announcement not delivered: {}", e);
                self.log.append(&format!("Failed to send announcement {text:?}: {e}"));
                false
            }
        }
    }

    /// Optionally announce startup to the chat, then record that the bot
    /// started. A failed announcement never stops startup.
    pub async fn announce_startup(&self, send_announcement: bool) {
        if send_announcement {
            self.announce(STARTUP_ANNOUNCEMENT).await;
        }
        self.log.append(STARTED_LOG_LINE);
    }

    /// Upload the signal log as a document.
    pub async fn upload_log(&self) -> UploadOutcome {
        let path = self.log.path();
        match self.transport.send_document(&self.chat_id, path).await {
            Ok(()) => {
                info!("Uploaded {}", path.display());
                UploadOutcome::Uploaded
            }
            Err(e) if e.is_not_found() => {
                debug!("No signal log at {} to upload", path.display());
                UploadOutcome::Missing
            }
            Err(e) => {
                warn!("Signal log upload failed: {}", e);
                self.log.append(&format!("Failed to upload log: {e}"));
                UploadOutcome::Failed
            }
        }
    }
}
