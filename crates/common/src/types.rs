//! Wire and domain types shared between the clients and the alerting engine.

use serde::{Deserialize, Serialize};

// ── Volatility provider ──────────────────────────────────────────────

/// One per-symbol volatility reading, produced fresh every poll cycle.
///
/// A record whose symbol could not be read carries an empty `symbol`; the
/// alert tracker never alerts on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolatilityRecord {
    pub symbol: String,
    /// Percentage figure for the current period.
    pub volatility: f64,
}

impl VolatilityRecord {
    pub fn new(symbol: impl Into<String>, volatility: f64) -> Self {
        Self {
            symbol: symbol.into(),
            volatility,
        }
    }
}

/// Outer envelope returned by the volatility endpoint.
///
/// `data` is kept as raw JSON so each record can be decoded on its own and a
/// single malformed entry does not discard the whole batch.
#[derive(Debug, Clone, Deserialize)]
pub struct VolatilityEnvelope {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub code: Option<serde_json::Value>,
    #[serde(default)]
    pub msg: Option<String>,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

// ── Chat platform ────────────────────────────────────────────────────

/// Generic Bot API response wrapper.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    #[serde(default)]
    pub error_code: Option<i64>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Inbound update from `getUpdates`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    #[serde(default)]
    pub from: Option<User>,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub is_bot: bool,
    #[serde(default)]
    pub username: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_without_message_deserializes() {
        let raw = r#"{"update_id": 42, "edited_message": {"message_id": 1}}"#;
        let update: Update = serde_json::from_str(raw).unwrap();
        assert_eq!(update.update_id, 42);
        assert!(update.message.is_none());
    }

    #[test]
    fn error_response_carries_code() {
        let raw = r#"{"ok": false, "error_code": 409, "description": "Conflict"}"#;
        let resp: ApiResponse<Vec<Update>> = serde_json::from_str(raw).unwrap();
        assert!(!resp.ok);
        assert!(resp.result.is_none());
        assert_eq!(resp.error_code, Some(409));
    }
}
