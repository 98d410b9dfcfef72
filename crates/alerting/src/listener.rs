//! Long-poll command listener.
//!
//! Receives updates, answers commands through the router and never exits on
//! its own. A 409 conflict (another consumer attached to the same bot) clears
//! the webhook before the receive loop restarts; any other transport error
//! just pauses and restarts.

use std::sync::Arc;
use std::time::Duration;

use common::{ChatTransport, Error, Update};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::commands::CommandRouter;
use crate::sink::SignalLog;

pub struct CommandListener {
    transport: Arc<dyn ChatTransport>,
    router: CommandRouter,
    log: SignalLog,
    long_poll_timeout_secs: u64,
    retry_delay: Duration,
}

impl CommandListener {
    pub fn new(
        transport: Arc<dyn ChatTransport>,
        router: CommandRouter,
        log: SignalLog,
        long_poll_timeout_secs: u64,
        retry_delay: Duration,
    ) -> Self {
        Self {
            transport,
            router,
            log,
            long_poll_timeout_secs,
            retry_delay,
        }
    }

    pub async fn run(&self, token: CancellationToken) {
        self.clear_webhook("startup").await;

        let mut offset: Option<i64> = None;
        loop {
            info!("Command listener receiving updates");
            self.log.append("Starting polling...");

            let err = tokio::select! {
                _ = token.cancelled() => break,
                e = self.receive_until_error(&mut offset) => e,
            };

            if err.is_conflict() {
                warn!("Update stream conflict: {}", err);
                self.log.append(&format!(
                    "Telegram 409 conflict: {err}. Removing webhook and restarting."
                ));
                self.clear_webhook("conflict").await;
            } else {
                warn!("Receive loop failed: {}", err);
                self.log.append(&format!("Polling error: {err}"));
            }

            tokio::select! {
                _ = token.cancelled() => break,
                _ = sleep(self.retry_delay) => {}
            }
        }

        info!("Command listener stopped");
    }

    async fn receive_until_error(&self, offset: &mut Option<i64>) -> Error {
        loop {
            if let Err(e) = self.poll_once(offset).await {
                return e;
            }
        }
    }

    /// One `getUpdates` round. Advances `offset` past every update received.
    pub async fn poll_once(&self, offset: &mut Option<i64>) -> Result<usize, Error> {
        let updates = self
            .transport
            .get_updates(*offset, self.long_poll_timeout_secs)
            .await?;

        for update in &updates {
            *offset = Some(update.update_id + 1);
            self.handle_update(update).await;
        }
        Ok(updates.len())
    }

    async fn handle_update(&self, update: &Update) {
        let Some(message) = &update.message else {
            return;
        };
        let Some(text) = message.text.as_deref() else {
            return;
        };
        let Some(reply) = self.router.route(text) else {
            debug!("No reply for update {}", update.update_id);
            return;
        };

        let chat_id = message.chat.id.to_string();
        let sender = message
            .from
            .as_ref()
            .map(|u| u.id.to_string())
            .unwrap_or_else(|| "unknown".into());

        match self
            .transport
            .send_message(&chat_id, &reply.text, Some(message.message_id))
            .await
        {
            Ok(()) => {
                if let Some(command) = &reply.command {
                    self.log.append(&format!("{command} from {sender}"));
                }
            }
            Err(e) => {
                warn!("Reply to {} failed: {}", sender, e);
                self.log.append(&format!("Reply failed for {sender}: {e}"));
            }
        }
    }

    async fn clear_webhook(&self, reason: &str) {
        match self.transport.delete_webhook().await {
            Ok(()) => {
                debug!("Webhook cleared ({})", reason);
                self.log.append(&format!("Webhook removed ({reason})."));
            }
            Err(e) => {
                warn!("Webhook removal failed ({}): {}", reason, e);
                self.log.append(&format!("Could not remove webhook ({reason}): {e}"));
            }
        }
    }
}
