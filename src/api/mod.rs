pub mod chart;
pub mod health;
pub mod memecoin;
pub mod stats;
pub mod whale_signals;

use crate::error::Result;
use crate::services::signal_store::DEFAULT_READ_LIMIT;
use crate::AppState;
use axum::body::Bytes;
use axum::Router;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(stats::router())
        .nest("/api/whale-signals", whale_signals::router())
        .nest("/api/memecoin-signals", memecoin::signals_router())
        .nest("/api/memecoin-score", memecoin::score_router())
        .nest("/api/chart", chart::router())
}

/// `?limit=N` on history reads. Kept as a string so that an unparseable
/// value falls back to the default instead of rejecting the request.
#[derive(Debug, Default, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<String>,
}

impl LimitQuery {
    /// Requested limit; missing or unparseable yields 50, 0 means all.
    pub fn limit(&self) -> usize {
        parse_limit(self.limit.as_deref())
    }
}

/// Negative values do not parse as a count and fall back to 50 as well.
pub fn parse_limit(raw: Option<&str>) -> usize {
    raw.and_then(|s| s.trim().parse().ok())
        .unwrap_or(DEFAULT_READ_LIMIT)
}

/// Body of a successful ingestion.
#[derive(Debug, Serialize, Deserialize)]
pub struct AddedResponse {
    pub status: String,
}

impl AddedResponse {
    pub fn added() -> Self {
        Self {
            status: "added".to_string(),
        }
    }
}

/// Decode an ingestion body. Any JSON is accepted; a non-object body is
/// treated as an empty payload and ill-typed fields become null.
pub fn decode_payload<T: DeserializeOwned + Default>(body: &Bytes) -> Result<T> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }

    let value: Value = serde_json::from_slice(body)?;
    match value {
        Value::Object(_) => Ok(serde_json::from_value(value)?),
        _ => Ok(T::default()),
    }
}
