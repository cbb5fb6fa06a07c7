use crate::AppState;
use axum::{extract::State, routing::get, Json, Router};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct WhaleStats {
    pub total: usize,
    pub buy: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MemecoinStats {
    pub total: usize,
}

/// Counts over the retained histories.
#[derive(Debug, Serialize, Deserialize)]
pub struct StatsResponse {
    pub whale_signals: WhaleStats,
    pub memecoin_signals: MemecoinStats,
}

/// GET /api/stats
async fn get_stats(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse {
        whale_signals: WhaleStats {
            total: state.whale_signals.len(),
            buy: state.whale_signals.buy_count(),
        },
        memecoin_signals: MemecoinStats {
            total: state.memecoin_signals.len(),
        },
    })
}

pub fn router() -> Router<AppState> {
    Router::new().route("/api/stats", get(get_stats))
}
