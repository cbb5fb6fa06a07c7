//! External collaborators.
//!
//! Each collaborator sits behind a narrow trait so the pipeline can be driven
//! by the live HTTP clients in production and by in-memory fakes in tests.

pub mod binance;
pub mod dexscreener;
pub mod ollama;
pub mod telegram;

pub use binance::BinanceClient;
pub use dexscreener::DexScreenerClient;
pub use ollama::OllamaClient;
pub use telegram::{DisabledTransport, TelegramNotifier};

use crate::types::{Candle, CandleInterval, OrderBookSnapshot};
use async_trait::async_trait;

/// Candle, order book and ticker queries.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Most recent `limit` candles, oldest first.
    async fn candles(
        &self,
        symbol: &str,
        interval: CandleInterval,
        limit: usize,
    ) -> anyhow::Result<Vec<Candle>>;

    /// Top `depth` levels on each side of the book.
    async fn order_book(&self, symbol: &str, depth: usize) -> anyhow::Result<OrderBookSnapshot>;

    /// Last traded price.
    async fn ticker_price(&self, symbol: &str) -> anyhow::Result<f64>;
}

/// Free-text advisory inference: prompt in, text out.
#[async_trait]
pub trait AdvisoryModel: Send + Sync {
    fn model_name(&self) -> &str;

    async fn generate(&self, prompt: &str) -> anyhow::Result<String>;
}

/// Best-effort chat alert delivery.
#[async_trait]
pub trait AlertTransport: Send + Sync {
    /// False when no destination is configured.
    fn is_enabled(&self) -> bool {
        true
    }

    async fn send(&self, message: &str) -> anyhow::Result<()>;
}

/// USD liquidity lookup for a symbol. `Ok(None)` means no market was found.
#[async_trait]
pub trait LiquidityLookup: Send + Sync {
    async fn liquidity_usd(&self, symbol: &str) -> anyhow::Result<Option<f64>>;
}
