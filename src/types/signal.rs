//! Stored signal records and their ingestion payloads.
//!
//! Ingestion payloads are deliberately permissive: every field is optional
//! and a field whose value does not fit its type is treated as absent
//! instead of rejecting the whole payload.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

use super::{clamp_confidence, Action, Decision, PriceSnapshot, RiskLevel, WhaleIndicator};

/// Deserialize an optional field, mapping ill-typed values to `None`.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// Like [`lenient`], for enum labels: string values match ignoring case
/// and surrounding whitespace.
fn lenient_label<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(label) => serde_json::Value::String(label.trim().to_uppercase()),
        other => other,
    };
    Ok(serde_json::from_value(value).ok())
}

/// A whale-pipeline signal as retained by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhaleSignal {
    pub id: u64,
    pub timestamp: DateTime<Utc>,
    pub symbol: Option<String>,
    pub price: Option<f64>,
    pub change_24h: Option<f64>,
    pub action: Option<Action>,
    pub confidence: Option<f64>,
    pub whale_signal: Option<WhaleIndicator>,
}

/// Partial whale signal accepted for ingestion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WhaleSignalInput {
    #[serde(default, deserialize_with = "lenient")]
    pub symbol: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub price: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub change_24h: Option<f64>,
    #[serde(default, deserialize_with = "lenient_label")]
    pub action: Option<Action>,
    #[serde(default, deserialize_with = "lenient")]
    pub confidence: Option<f64>,
    #[serde(default, deserialize_with = "lenient_label")]
    pub whale_signal: Option<WhaleIndicator>,
}

impl WhaleSignalInput {
    /// Build the record the monitor loop appends for one evaluated symbol.
    pub fn from_decision(
        symbol: &str,
        price: PriceSnapshot,
        decision: Decision,
        whale_signal: WhaleIndicator,
    ) -> Self {
        Self {
            symbol: Some(symbol.to_string()),
            price: Some(price.price),
            change_24h: Some(price.change_24h),
            action: Some(decision.action),
            confidence: Some(decision.confidence),
            whale_signal: Some(whale_signal),
        }
    }

    /// Finalize into a stored record with the given id and timestamp.
    pub fn into_signal(self, id: u64, timestamp: DateTime<Utc>) -> WhaleSignal {
        WhaleSignal {
            id,
            timestamp,
            symbol: self.symbol,
            price: self.price,
            change_24h: self.change_24h,
            action: self.action,
            confidence: self.confidence.map(clamp_confidence),
            whale_signal: self.whale_signal,
        }
    }
}

/// A memecoin signal as retained by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemecoinSignal {
    pub id: u64,
    pub timestamp: DateTime<Utc>,
    pub symbol: Option<String>,
    pub score: Option<f64>,
    pub risk_level: Option<RiskLevel>,
}

impl MemecoinSignal {
    /// Score used for ranking; a missing score ranks as zero.
    pub fn rank_score(&self) -> f64 {
        self.score.unwrap_or(0.0)
    }
}

/// Partial memecoin signal accepted for ingestion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemecoinSignalInput {
    #[serde(default, deserialize_with = "lenient")]
    pub symbol: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub score: Option<f64>,
    #[serde(default, deserialize_with = "lenient_label")]
    pub risk_level: Option<RiskLevel>,
}

impl MemecoinSignalInput {
    pub fn into_signal(self, id: u64, timestamp: DateTime<Utc>) -> MemecoinSignal {
        MemecoinSignal {
            id,
            timestamp,
            symbol: self.symbol,
            score: self.score,
            risk_level: self.risk_level,
        }
    }
}

/// A slice of retained signals plus the number currently retained.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalPage<T> {
    pub signals: Vec<T>,
    pub total: usize,
}
