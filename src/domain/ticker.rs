//! Raw ticker records as published by the exchange.
//!
//! The exchange is loose about types: quotes arrive as JSON numbers,
//! numeric strings, `null`, or not at all. Everything numeric is coerced
//! here, once, so the rest of the pipeline only ever sees `f64`.

use chrono::{Local, TimeZone};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// One ticker record from the exchange's public ticker endpoint.
///
/// Only `market` is mandatory. Quote fields that are absent, `null`,
/// non-numeric, negative or non-finite coerce to `0.0`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawTicker {
    /// Market symbol, e.g. `"BTCINR"` or `"BTCUSDT"`.
    pub market: String,
    /// Best bid.
    #[serde(default, deserialize_with = "lenient_quote")]
    pub bid: f64,
    /// Best ask.
    #[serde(default, deserialize_with = "lenient_quote")]
    pub ask: f64,
    /// 24h traded volume.
    #[serde(default, deserialize_with = "lenient_quote")]
    pub volume: f64,
    /// Last update time in Unix seconds.
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub timestamp: Option<i64>,
}

impl RawTicker {
    /// Convenience constructor used by tests and benches.
    pub fn new(market: impl Into<String>, bid: f64, ask: f64) -> Self {
        Self {
            market: market.into(),
            bid,
            ask,
            ..Self::default()
        }
    }

    /// Builder-style volume setter.
    #[must_use]
    pub fn with_volume(mut self, volume: f64) -> Self {
        self.volume = volume;
        self
    }

    /// Builder-style timestamp setter.
    #[must_use]
    pub fn with_timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }
}

/// Coerce an arbitrary JSON value into a non-negative quote.
pub fn coerce_quote(value: &Value) -> f64 {
    parse_number(value)
        .filter(|v| v.is_finite() && *v >= 0.0)
        .unwrap_or(0.0)
}

fn parse_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn lenient_quote<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(coerce_quote(&value))
}

#[allow(clippy::cast_possible_truncation)]
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(parse_number(&value)
        .filter(|v| v.is_finite() && *v >= 0.0)
        .map(|v| v.trunc() as i64))
}

/// Render a Unix-seconds timestamp as local wall-clock time (`HH:MM:SS`).
///
/// Missing or out-of-range timestamps render as `"-"`.
pub fn format_local_time(timestamp: Option<i64>) -> String {
    timestamp
        .and_then(|secs| Local.timestamp_opt(secs, 0).single())
        .map_or_else(|| "-".to_string(), |t| t.format("%H:%M:%S").to_string())
}
