//! Configuration loader: merges env vars, .env file, and config.toml.

use common::config::BotConfig;
use common::Error;
use std::path::Path;

/// Longest `getUpdates` wait the Bot API honours.
const MAX_LONG_POLL_SECS: u64 = 50;

fn parse_positive_f64(raw: &str, env_name: &str) -> Result<f64, Error> {
    let parsed = raw
        .trim()
        .parse::<f64>()
        .map_err(|_| Error::Config(format!("{env_name} must be a number > 0")))?;
    if !parsed.is_finite() || parsed <= 0.0 {
        return Err(Error::Config(format!("{env_name} must be a number > 0")));
    }
    Ok(parsed)
}

fn parse_positive_u64(raw: &str, env_name: &str) -> Result<u64, Error> {
    match raw.trim().parse::<u64>() {
        Ok(v) if v > 0 => Ok(v),
        _ => Err(Error::Config(format!("{env_name} must be an integer > 0"))),
    }
}

fn parse_bool(raw: &str) -> bool {
    let lowered = raw.trim().to_ascii_lowercase();
    lowered != "0" && lowered != "false" && lowered != "no" && lowered != "off"
}

/// First non-empty value among `names`.
fn env_first(names: &[&str]) -> Option<String> {
    names
        .iter()
        .filter_map(|n| std::env::var(n).ok())
        .map(|v| v.trim().to_string())
        .find(|v| !v.is_empty())
}

fn validate_config(config: &BotConfig) -> Result<(), Error> {
    let mut issues: Vec<String> = Vec::new();

    if !config.alerts.threshold.is_finite() || config.alerts.threshold <= 0.0 {
        issues.push("alerts.threshold must be > 0".into());
    }
    if config.alerts.log_file.trim().is_empty() {
        issues.push("alerts.log_file must not be empty".into());
    }
    if let Err(e) = alerting::parse_timezone(&config.alerts.timezone) {
        issues.push(format!("alerts.timezone: {e}"));
    }

    if config.coinglass.volatility_url.trim().is_empty() {
        issues.push("coinglass.volatility_url must not be empty".into());
    }
    if config.coinglass.secret_header.trim().is_empty() {
        issues.push("coinglass.secret_header must not be empty".into());
    }
    if config.coinglass.http_timeout_secs == 0 {
        issues.push("coinglass.http_timeout_secs must be > 0".into());
    }

    if config.telegram.api_base.trim().is_empty() {
        issues.push("telegram.api_base must not be empty".into());
    }
    if config.telegram.long_poll_timeout_secs == 0
        || config.telegram.long_poll_timeout_secs > MAX_LONG_POLL_SECS
    {
        issues.push(format!(
            "telegram.long_poll_timeout_secs must be in 1..={MAX_LONG_POLL_SECS}"
        ));
    }
    if config.telegram.sends_per_minute == 0 {
        issues.push("telegram.sends_per_minute must be > 0".into());
    }

    if config.timing.poll_interval_secs == 0 {
        issues.push("timing.poll_interval_secs must be > 0".into());
    }
    if config.timing.error_backoff_secs == 0 {
        issues.push("timing.error_backoff_secs must be > 0".into());
    }
    if config.timing.listener_retry_secs == 0 {
        issues.push("timing.listener_retry_secs must be > 0".into());
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(Error::Config(format!(
            "Invalid config:\n - {}",
            issues.join("\n - ")
        )))
    }
}

/// Names of required secrets that are still empty. Not fatal: a missing
/// secret shows up as an authentication failure on first use.
pub fn missing_secrets(config: &BotConfig) -> Vec<&'static str> {
    let mut missing = Vec::new();
    if config.coinglass_api_key.is_empty() {
        missing.push("COINGLASS_API_KEY");
    }
    if config.telegram_token.is_empty() {
        missing.push("TELEGRAM_TOKEN");
    }
    if config.chat_id.is_empty() {
        missing.push("CHAT_ID");
    }
    missing
}

/// Apply environment overrides on top of a file/default config.
fn apply_env(config: &mut BotConfig) -> Result<(), Error> {
    if let Some(key) = env_first(&["COINGLASS_API_KEY"]) {
        config.coinglass_api_key = key;
    }
    if let Some(token) = env_first(&["TELEGRAM_TOKEN", "BOT_TOKEN"]) {
        config.telegram_token = token;
    }
    if let Some(chat) = env_first(&["CHAT_ID"]) {
        config.chat_id = chat;
    }
    if let Ok(raw) = std::env::var("VOLATILITY_THRESHOLD") {
        config.alerts.threshold = parse_positive_f64(&raw, "VOLATILITY_THRESHOLD")?;
    }
    if let Ok(raw) = std::env::var("POLL_INTERVAL_SECS") {
        config.timing.poll_interval_secs = parse_positive_u64(&raw, "POLL_INTERVAL_SECS")?;
    }
    if let Some(tz) = env_first(&["BOT_TIMEZONE"]) {
        config.alerts.timezone = tz;
    }
    if let Some(path) = env_first(&["SIGNAL_LOG_FILE"]) {
        config.alerts.log_file = path;
    }
    if let Ok(raw) = std::env::var("ECHO_UNKNOWN") {
        config.telegram.echo_unknown_text = parse_bool(&raw);
    }
    Ok(())
}

/// Load bot configuration from environment and optional config file.
pub fn load_config() -> Result<BotConfig, Error> {
    // 1. Load .env file from project root or parent directories.
    if let Err(e) = dotenvy::dotenv() {
        tracing::debug!("No .env file loaded: {}", e);
    }

    // 2. Start with defaults.
    let mut config = BotConfig::default();

    // 3. Try loading config.toml if it exists.
    let config_path = Path::new("config.toml");
    if config_path.exists() {
        let contents = std::fs::read_to_string(config_path)
            .map_err(|e| Error::Config(format!("Failed to read config.toml: {}", e)))?;
        config = toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse config.toml: {}", e)))?;
    }

    // 4. Override with environment variables (highest priority).
    apply_env(&mut config)?;

    // 5. Validate structure; secrets are checked lazily by the services.
    validate_config(&config)?;

    Ok(config)
}
