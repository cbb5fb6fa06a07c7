//! Candle chart endpoint.

use crate::error::{AppError, Result};
use crate::types::{CandleInterval, ChartCandle};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

const DEFAULT_CHART_LIMIT: usize = 100;
const MAX_CHART_LIMIT: usize = 1000;

#[derive(Debug, Default, Deserialize)]
pub struct ChartQuery {
    /// Candle interval, e.g. "1h" (default).
    pub interval: Option<String>,
    pub limit: Option<String>,
}

impl ChartQuery {
    pub fn interval(&self) -> Result<CandleInterval> {
        match self.interval.as_deref() {
            None => Ok(CandleInterval::OneHour),
            Some(raw) => CandleInterval::from_str(raw.trim())
                .ok_or_else(|| AppError::BadRequest(format!("Unsupported interval: {}", raw))),
        }
    }

    /// Requested candle count, defaulting to 100 and capped at 1000.
    pub fn limit(&self) -> usize {
        self.limit
            .as_deref()
            .and_then(|s| s.trim().parse::<usize>().ok())
            .filter(|&n| n > 0)
            .unwrap_or(DEFAULT_CHART_LIMIT)
            .min(MAX_CHART_LIMIT)
    }
}

pub fn router() -> Router<AppState> {
    Router::new().route("/:symbol", get(get_chart))
}

/// GET /api/chart/:symbol?interval=1h&limit=100
async fn get_chart(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    Query(query): Query<ChartQuery>,
) -> Result<Json<Vec<ChartCandle>>> {
    let interval = query.interval()?;
    let symbol = symbol.trim().to_uppercase();

    let candles = state
        .market_data
        .candles(&symbol, interval, query.limit())
        .await
        .map_err(|e| AppError::Provider(e.to_string()))?;

    Ok(Json(candles.iter().map(ChartCandle::from).collect()))
}
