//! Memecoin history and on-demand scoring endpoints.

use crate::api::{decode_payload, AddedResponse, LimitQuery};
use crate::error::Result;
use crate::types::{MemecoinScore, MemecoinSignal, MemecoinSignalInput, SignalPage};
use crate::AppState;
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Default, Deserialize)]
pub struct ScoreQuery {
    /// Also append the score to the memecoin history.
    pub record: Option<String>,
}

impl ScoreQuery {
    pub fn should_record(&self) -> bool {
        matches!(
            self.record.as_deref().map(str::trim),
            Some("true") | Some("1")
        )
    }
}

pub fn signals_router() -> Router<AppState> {
    Router::new().route("/", get(list_signals).post(add_signal))
}

pub fn score_router() -> Router<AppState> {
    Router::new().route("/:symbol", get(score_symbol))
}

/// GET /api/memecoin-signals?limit=N
///
/// Sorted by score descending, then the trailing `limit` entries.
async fn list_signals(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> Json<SignalPage<MemecoinSignal>> {
    Json(state.memecoin_signals.ranked_tail(query.limit()))
}

/// POST /api/memecoin-signals
async fn add_signal(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<AddedResponse>)> {
    let input: MemecoinSignalInput = decode_payload(&body)?;
    let signal = state.memecoin_signals.append(input);
    debug!("Ingested memecoin signal {}", signal.id);
    Ok((StatusCode::CREATED, Json(AddedResponse::added())))
}

/// GET /api/memecoin-score/:symbol?record=bool
async fn score_symbol(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    Query(query): Query<ScoreQuery>,
) -> Json<MemecoinScore> {
    let symbol = symbol.trim().to_uppercase();
    let score = state.memecoin_scorer.score(&symbol).await;

    if query.should_record() {
        state.memecoin_signals.append(MemecoinSignalInput {
            symbol: Some(score.symbol.clone()),
            score: Some(f64::from(score.total_score)),
            risk_level: Some(score.risk),
        });
    }

    Json(score)
}
