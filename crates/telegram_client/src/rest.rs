//! REST client for the Telegram Bot API.
//!
//! Covers: text messages, document upload, long-poll updates, webhook
//! removal and the identity probe. Sends are rate-limited.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use common::config::TelegramConfig;
use common::{ApiResponse, ChatTransport, Error, Update, User};
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::debug;

use crate::rate_limit::RateLimiter;

/// Extra client-side slack on top of the server-side long-poll wait.
const LONG_POLL_SLACK: Duration = Duration::from_secs(10);

/// Async client bound to one bot token.
#[derive(Debug, Clone)]
pub struct TelegramClient {
    client: reqwest::Client,
    base_url: String,
    limiter: RateLimiter,
}

impl TelegramClient {
    pub fn new(token: &str, cfg: &TelegramConfig) -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .pool_max_idle_per_host(2)
            .tcp_keepalive(Duration::from_secs(30))
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| Error::Http(format!("failed to build Telegram HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: format!("{}/bot{}", cfg.api_base.trim_end_matches('/'), token),
            limiter: RateLimiter::per_minute(cfg.sends_per_minute),
        })
    }

    /// URL helper. Never log the result: it embeds the token.
    fn url(&self, method: &str) -> String {
        format!("{}/{}", self.base_url, method)
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        method: &str,
        body: &Value,
        timeout: Option<Duration>,
    ) -> Result<T, Error> {
        let mut req = self.client.post(self.url(method)).json(body);
        if let Some(t) = timeout {
            req = req.timeout(t);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| Error::Http(e.without_url().to_string()))?;
        read_response(method, resp).await
    }

    // ── Outbound ──────────────────────────────────────────────────────

    /// Send a text message, optionally as a reply.
    pub async fn send_text(
        &self,
        chat_id: &str,
        text: &str,
        reply_to: Option<i64>,
    ) -> Result<(), Error> {
        self.limiter.wait_send().await;

        let mut body = json!({ "chat_id": chat_id, "text": text });
        if let Some(id) = reply_to {
            body["reply_to_message_id"] = json!(id);
        }
        let _: Value = self.post_json("sendMessage", &body, None).await?;
        debug!("sendMessage ok (chat={})", chat_id);
        Ok(())
    }

    /// Upload a local file as a document, keeping its file name.
    pub async fn upload_document(&self, chat_id: &str, path: &Path) -> Result<(), Error> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document.txt".into());

        self.limiter.wait_send().await;

        let form = Form::new()
            .text("chat_id", chat_id.to_string())
            .part("document", Part::bytes(bytes).file_name(file_name.clone()));

        let resp = self
            .client
            .post(self.url("sendDocument"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| Error::Http(e.without_url().to_string()))?;
        let _: Value = read_response("sendDocument", resp).await?;
        debug!("sendDocument ok ({})", file_name);
        Ok(())
    }

    // ── Inbound / housekeeping ────────────────────────────────────────

    /// Long-poll for message updates.
    pub async fn fetch_updates(
        &self,
        offset: Option<i64>,
        timeout_secs: u64,
    ) -> Result<Vec<Update>, Error> {
        let mut body = json!({ "timeout": timeout_secs, "allowed_updates": ["message"] });
        if let Some(o) = offset {
            body["offset"] = json!(o);
        }
        self.post_json("getUpdates", &body, Some(long_poll_wait(timeout_secs)))
            .await
    }

    /// Remove the webhook so pull-based `getUpdates` is allowed.
    pub async fn remove_webhook(&self) -> Result<(), Error> {
        let _: bool = self
            .post_json("deleteWebhook", &json!({ "drop_pending_updates": false }), None)
            .await?;
        Ok(())
    }

    /// Identity probe; fails fast on a bad token.
    pub async fn get_me(&self) -> Result<User, Error> {
        self.post_json("getMe", &json!({}), None).await
    }
}

#[async_trait]
impl ChatTransport for TelegramClient {
    async fn send_message(&self, chat_id: &str, text: &str, reply_to: Option<i64>) -> Result<(), Error> {
        self.send_text(chat_id, text, reply_to).await
    }

    async fn send_document(&self, chat_id: &str, path: &Path) -> Result<(), Error> {
        self.upload_document(chat_id, path).await
    }

    async fn get_updates(&self, offset: Option<i64>, timeout_secs: u64) -> Result<Vec<Update>, Error> {
        self.fetch_updates(offset, timeout_secs).await
    }

    async fn delete_webhook(&self) -> Result<(), Error> {
        self.remove_webhook().await
    }
}

/// Client-side timeout for a long poll of `timeout_secs`.
fn long_poll_wait(timeout_secs: u64) -> Duration {
    Duration::from_secs(timeout_secs).saturating_add(LONG_POLL_SLACK)
}

async fn read_response<T: DeserializeOwned>(
    method: &str,
    resp: reqwest::Response,
) -> Result<T, Error> {
    let status = resp.status().as_u16();
    let body = resp
        .text()
        .await
        .map_err(|e| Error::Http(e.without_url().to_string()))?;
    decode_response(method, status, &body)
}

/// Map a Bot API body onto `Result`.
///
/// Error responses keep the platform's `error_code` so callers can tell a
/// 409 conflict from other failures. Bodies that are not the API envelope
/// (proxies, gateways) become `Error::Http` with the HTTP status.
pub fn decode_response<T: DeserializeOwned>(
    method: &str,
    status: u16,
    body: &str,
) -> Result<T, Error> {
    let envelope: ApiResponse<T> = match serde_json::from_str(body) {
        Ok(env) => env,
        Err(e) => {
            let head: String = body.chars().take(200).collect();
            return Err(Error::Http(format!(
                "{method}: HTTP {status}, undecodable body ({e}): {head}"
            )));
        }
    };

    if !envelope.ok {
        return Err(Error::TelegramApi {
            code: envelope.error_code.unwrap_or(i64::from(status)),
            description: envelope
                .description
                .unwrap_or_else(|| format!("{method} failed")),
        });
    }

    envelope
        .result
        .ok_or_else(|| Error::Other(format!("{method}: ok response without result")))
}
