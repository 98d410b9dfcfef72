//! Bot configuration types.

use serde::{Deserialize, Serialize};

/// Top-level bot configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    /// Coinglass API secret, sent in the provider's secret header.
    #[serde(default)]
    pub coinglass_api_key: String,

    /// Telegram bot token.
    #[serde(default)]
    pub telegram_token: String,

    /// Destination chat for alerts, uploads and announcements.
    #[serde(default)]
    pub chat_id: String,

    /// Volatility provider endpoint.
    #[serde(default)]
    pub coinglass: CoinglassConfig,

    /// Alert thresholds and signal log.
    #[serde(default)]
    pub alerts: AlertConfig,

    /// Chat transport behaviour.
    #[serde(default)]
    pub telegram: TelegramConfig,

    /// Timing parameters (seconds).
    #[serde(default)]
    pub timing: TimingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoinglassConfig {
    #[serde(default = "default_volatility_url")]
    pub volatility_url: String,

    /// Header name carrying the API secret.
    #[serde(default = "default_secret_header")]
    pub secret_header: String,

    #[serde(default = "default_http_timeout")]
    pub http_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertConfig {
    /// Inclusive volatility threshold in percent.
    #[serde(default = "default_threshold")]
    pub threshold: f64,

    /// IANA zone used for the day boundary and log timestamps.
    #[serde(default = "default_timezone")]
    pub timezone: String,

    /// Append-only signal log, relative to the working directory.
    #[serde(default = "default_log_file")]
    pub log_file: String,

    /// Send a message to the channel once both duty cycles are up.
    #[serde(default = "default_true")]
    pub startup_announcement: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Server-side wait for `getUpdates`.
    #[serde(default = "default_long_poll_timeout")]
    pub long_poll_timeout_secs: u64,

    /// Reply to plain (non-command) text with the same text.
    #[serde(default)]
    pub echo_unknown_text: bool,

    /// Outbound send allowance per minute.
    #[serde(default = "default_sends_per_minute")]
    pub sends_per_minute: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Sleep between poll cycles.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Pause before a crashed duty cycle is restarted.
    #[serde(default = "default_error_backoff")]
    pub error_backoff_secs: u64,

    /// Pause before the command listener re-enters its receive loop.
    #[serde(default = "default_listener_retry")]
    pub listener_retry_secs: u64,
}

// ── Defaults ──────────────────────────────────────────────────────────

fn default_true() -> bool {
    true
}
fn default_volatility_url() -> String {
    "https://open-api.coinglass.com/api/pro/v1/indicator/volatility".into()
}
fn default_secret_header() -> String {
    "coinglassSecret".into()
}
fn default_http_timeout() -> u64 {
    10
}
fn default_threshold() -> f64 {
    10.0
}
fn default_timezone() -> String {
    "Europe/Prague".into()
}
fn default_log_file() -> String {
    "signals_log.txt".into()
}
fn default_api_base() -> String {
    "https://api.telegram.org".into()
}
fn default_long_poll_timeout() -> u64 {
    30
}
fn default_sends_per_minute() -> u32 {
    20
}
fn default_poll_interval() -> u64 {
    60
}
fn default_error_backoff() -> u64 {
    30
}
fn default_listener_retry() -> u64 {
    5
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            coinglass_api_key: String::new(),
            telegram_token: String::new(),
            chat_id: String::new(),
            coinglass: CoinglassConfig::default(),
            alerts: AlertConfig::default(),
            telegram: TelegramConfig::default(),
            timing: TimingConfig::default(),
        }
    }
}

impl Default for CoinglassConfig {
    fn default() -> Self {
        Self {
            volatility_url: default_volatility_url(),
            secret_header: default_secret_header(),
            http_timeout_secs: default_http_timeout(),
        }
    }
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            timezone: default_timezone(),
            log_file: default_log_file(),
            startup_announcement: true,
        }
    }
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            long_poll_timeout_secs: default_long_poll_timeout(),
            echo_unknown_text: false,
            sends_per_minute: default_sends_per_minute(),
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval(),
            error_backoff_secs: default_error_backoff(),
            listener_retry_secs: default_listener_retry(),
        }
    }
}
