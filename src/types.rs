//! Core types for the Kiva bot

use rust_decimal::Decimal;
use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Outcome of one account's collection
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AccountStatus {
    #[default]
    Running,
    Error(String),
}

impl AccountStatus {
    pub fn is_error(&self) -> bool {
        matches!(self, AccountStatus::Error(_))
    }
}

impl fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccountStatus::Running => write!(f, "Running"),
            AccountStatus::Error(msg) => write!(f, "Error: {}", msg),
        }
    }
}

/// Per-account record for one cycle, filled in as each API call returns
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccountStats {
    pub id: Option<String>,
    pub nickname: Option<String>,
    /// Raw balance with the currency suffix, e.g. `"12.5 Kiva"`
    pub balance: Option<String>,
    /// Parsed balance, used for increments
    pub balance_value: Option<Decimal>,
    pub mining_time: Option<String>,
    /// `host:port` of the proxy that served the most recent call
    pub proxy: Option<String>,
    pub status: AccountStatus,
}

impl AccountStats {
    pub fn new() -> Self {
        Self::default()
    }
}

/// `{ "object": { ... } }` wrapper used by every endpoint
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: DeserializeOwned"))]
pub struct Envelope<T> {
    #[serde(default)]
    pub object: Option<T>,
}

impl<T: DeserializeOwned> Envelope<T> {
    /// Decode a response body and take its `object`
    pub fn unwrap_object(body: Value) -> Result<T, String> {
        let envelope: Envelope<T> = serde_json::from_value(body).map_err(|e| e.to_string())?;
        envelope
            .object
            .ok_or_else(|| "response has no object".to_string())
    }
}

/// `getUserInfo` payload
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub id: Option<String>,
    #[serde(default)]
    pub nick_name: Option<String>,
}

/// `getMyAccountInfo` payload
#[derive(Debug, Clone, Deserialize)]
pub struct AccountInfo {
    #[serde(deserialize_with = "string_or_number")]
    pub balance: String,
}

impl AccountInfo {
    /// Balance as a decimal, if the API sent something numeric
    pub fn balance_value(&self) -> Option<Decimal> {
        let raw = self.balance.trim();
        Decimal::from_str(raw)
            .or_else(|_| Decimal::from_scientific(raw))
            .ok()
    }
}

/// `getSignInfo` payload, epoch milliseconds
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInfo {
    #[serde(deserialize_with = "epoch_millis")]
    pub sign_time: i64,
    #[serde(deserialize_with = "epoch_millis")]
    pub now_time: i64,
}

/// Format the time since signing as `"{h}h {m}m {s}s"`.
///
/// Components are floored from the fractional second difference and the
/// remainders keep the sign of the difference, so `now < sign` yields negative
/// components (e.g. `"-1h -1m -2s"` for -1.5s).
pub fn calculate_mining_time(sign_time_ms: i64, now_time_ms: i64) -> String {
    // i128 so timestamps at the ends of the i64 range cannot overflow
    let diff_secs = (i128::from(now_time_ms) - i128::from(sign_time_ms)) as f64 / 1000.0;
    let hours = (diff_secs / 3600.0).floor() as i64;
    let minutes = ((diff_secs % 3600.0) / 60.0).floor() as i64;
    let seconds = (diff_secs % 60.0).floor() as i64;
    format!("{}h {}m {}s", hours, minutes, seconds)
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(D::Error::custom(format!(
            "expected string or number, got {}",
            other
        ))),
    }
}

fn optional_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Number(n) => Ok(Some(n.to_string())),
        other => Err(D::Error::custom(format!(
            "expected string or number, got {}",
            other
        ))),
    }
}

fn epoch_millis<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| D::Error::custom(format!("invalid timestamp '{}'", s))),
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64))
            .ok_or_else(|| D::Error::custom(format!("invalid timestamp {}", n))),
        other => Err(D::Error::custom(format!(
            "expected timestamp, got {}",
            other
        ))),
    }
}
