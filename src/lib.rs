//! Whale Radar - market microstructure monitor with advisory-backed alerts

pub mod api;
pub mod config;
pub mod error;
pub mod services;
pub mod sources;
pub mod types;

use axum::Router;
use services::{MemecoinScorer, MemecoinSignalStore, WhaleSignalStore};
use sources::MarketDataProvider;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub whale_signals: Arc<WhaleSignalStore>,
    pub memecoin_signals: Arc<MemecoinSignalStore>,
    pub market_data: Arc<dyn MarketDataProvider>,
    pub memecoin_scorer: Arc<MemecoinScorer>,
}

/// Build the HTTP application with CORS and request tracing.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(api::router())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
