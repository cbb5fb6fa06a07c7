//! Whale signal history endpoints.

use crate::api::{decode_payload, AddedResponse, LimitQuery};
use crate::error::Result;
use crate::types::{SignalPage, WhaleSignal, WhaleSignalInput};
use crate::AppState;
use axum::{
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::debug;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list_signals).post(add_signal))
}

/// GET /api/whale-signals?limit=N
async fn list_signals(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> Json<SignalPage<WhaleSignal>> {
    Json(state.whale_signals.recent(query.limit()))
}

/// POST /api/whale-signals
async fn add_signal(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<AddedResponse>)> {
    let input: WhaleSignalInput = decode_payload(&body)?;
    let signal = state.whale_signals.append(input);
    debug!("Ingested whale signal {}", signal.id);
    Ok((StatusCode::CREATED, Json(AddedResponse::added())))
}
