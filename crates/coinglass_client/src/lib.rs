//! Coinglass volatility API client.
//!
//! One bounded-timeout GET per poll cycle against the volatility indicator
//! endpoint, decoded leniently into `VolatilityRecord`s.

use std::time::Duration;

use async_trait::async_trait;
use common::config::CoinglassConfig;
use common::{Error, VolatilityEnvelope, VolatilityRecord, VolatilitySource};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

/// Async REST client for the Coinglass volatility indicator.
#[derive(Debug, Clone)]
pub struct CoinglassClient {
    client: reqwest::Client,
    url: String,
    secret_header: String,
    api_key: String,
}

/// Per-record shape; every field is optional so a partial entry still decodes.
#[derive(Debug, Deserialize)]
struct RawRecord {
    #[serde(default)]
    symbol: Option<Value>,
    #[serde(default)]
    volatility: Option<Value>,
}

impl CoinglassClient {
    pub fn new(cfg: &CoinglassConfig, api_key: String) -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .user_agent("volatility-bot/0.1")
            .pool_max_idle_per_host(2)
            .timeout(Duration::from_secs(cfg.http_timeout_secs))
            .build()
            .map_err(|e| Error::Http(format!("failed to build Coinglass HTTP client: {e}")))?;

        Ok(Self {
            client,
            url: cfg.volatility_url.clone(),
            secret_header: cfg.secret_header.clone(),
            api_key,
        })
    }

    /// Fetch the current volatility list.
    pub async fn get_volatility(&self) -> Result<Vec<VolatilityRecord>, Error> {
        debug!("Fetching Coinglass volatility: {}", self.url);

        let resp = self
            .client
            .get(&self.url)
            .header(self.secret_header.as_str(), self.api_key.as_str())
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        let status = resp.status().as_u16();
        if status != 200 {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Coinglass(format!(
                "Coinglass returned {}: {}",
                status,
                excerpt(&body)
            )));
        }

        let body = resp.text().await.map_err(|e| Error::Http(e.to_string()))?;
        let records = parse_volatility_payload(&body)?;

        debug!("Got {} volatility records", records.len());
        Ok(records)
    }
}

#[async_trait]
impl VolatilitySource for CoinglassClient {
    async fn fetch(&self) -> Result<Vec<VolatilityRecord>, Error> {
        self.get_volatility().await
    }
}

/// Decode a response body into records.
///
/// A missing `data` key is an empty batch. A provider-reported failure or a
/// non-array `data` is an error. Entries are decoded one by one; entries that
/// are not objects, or whose volatility is neither a number nor a numeric
/// string, are dropped.
pub fn parse_volatility_payload(body: &str) -> Result<Vec<VolatilityRecord>, Error> {
    let envelope: VolatilityEnvelope = serde_json::from_str(body)?;

    if envelope.success == Some(false) {
        return Err(Error::Coinglass(format!(
            "request rejected (code={}): {}",
            envelope
                .code
                .map(|c| c.to_string())
                .unwrap_or_else(|| "?".into()),
            envelope.msg.unwrap_or_default()
        )));
    }

    let items = match envelope.data {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(items)) => items,
        Some(other) => {
            return Err(Error::Payload(format!(
                "expected `data` to be an array, got {}",
                json_kind(&other)
            )))
        }
    };

    let mut records = Vec::with_capacity(items.len());
    for item in items {
        if !item.is_object() {
            debug!("Skipping non-object volatility entry: {}", json_kind(&item));
            continue;
        }
        let raw: RawRecord = match serde_json::from_value(item) {
            Ok(r) => r,
            Err(e) => {
                debug!("Skipping undecodable volatility entry: {}", e);
                continue;
            }
        };
        if let Some(record) = to_record(raw) {
            records.push(record);
        }
    }
    Ok(records)
}

fn to_record(raw: RawRecord) -> Option<VolatilityRecord> {
    let symbol = match raw.symbol {
        Some(Value::String(s)) => s,
        _ => String::new(),
    };

    let volatility = match raw.volatility {
        None | Some(Value::Null) => 0.0,
        Some(Value::Number(n)) => n.as_f64()?,
        Some(Value::String(s)) => match s.trim().parse::<f64>() {
            Ok(v) => v,
            Err(_) => {
                debug!("Skipping {}: non-numeric volatility {:?}", symbol, s);
                return None;
            }
        },
        Some(other) => {
            debug!("Skipping {}: volatility is {}", symbol, json_kind(&other));
            return None;
        }
    };

    Some(VolatilityRecord { symbol, volatility })
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn excerpt(body: &str) -> &str {
    match body.char_indices().nth(500) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}
