//! In-memory collaborators shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use whale_radar::services::{
    AlertDeduplicator, DecisionEngine, FeatureExtractor, MemecoinScorer, MemecoinSignalStore,
    MonitorLoop, ParseMode, WhaleSignalStore,
};
use whale_radar::sources::{AdvisoryModel, AlertTransport, LiquidityLookup, MarketDataProvider};
use whale_radar::types::{Candle, CandleInterval, OrderBookLevel, OrderBookSnapshot};
use whale_radar::AppState;

// ============================================================================
// Candle builders
// ============================================================================

pub fn candles_from_closes(closes: &[f64]) -> Vec<Candle> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| Candle {
            open_time: 1_700_000_000_000 + i as i64 * 60_000,
            open: close,
            high: close,
            low: close,
            close,
            volume: 10.0,
            quote_volume: 10.0 * close,
            close_time: 1_700_000_000_000 + (i as i64 + 1) * 60_000 - 1,
        })
        .collect()
}

pub fn candles_from_volumes(volumes: &[f64]) -> Vec<Candle> {
    volumes
        .iter()
        .enumerate()
        .map(|(i, &quote_volume)| Candle {
            open_time: 1_700_000_000_000 + i as i64 * 60_000,
            open: 100.0,
            high: 100.0,
            low: 100.0,
            close: 100.0,
            volume: quote_volume / 100.0,
            quote_volume,
            close_time: 1_700_000_000_000 + (i as i64 + 1) * 60_000 - 1,
        })
        .collect()
}

pub fn book(symbol: &str, bid_qty: f64, ask_qty: f64) -> OrderBookSnapshot {
    OrderBookSnapshot {
        symbol: symbol.to_string(),
        bids: vec![OrderBookLevel {
            price: 99.0,
            quantity: bid_qty,
        }],
        asks: vec![OrderBookLevel {
            price: 101.0,
            quantity: ask_qty,
        }],
    }
}

// ============================================================================
// Market data
// ============================================================================

#[derive(Default)]
struct MarketState {
    prices: HashMap<String, f64>,
    books: HashMap<String, OrderBookSnapshot>,
    candles: HashMap<(String, CandleInterval), Vec<Candle>>,
    failing: HashSet<String>,
    panicking: HashSet<String>,
}

/// Scripted market-data provider. Unknown symbols are reported as errors.
#[derive(Default)]
pub struct FakeMarket {
    state: Mutex<MarketState>,
    pub calls: AtomicUsize,
}

impl FakeMarket {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_price(self, symbol: &str, price: f64) -> Self {
        self.state
            .lock()
            .unwrap()
            .prices
            .insert(symbol.to_string(), price);
        self
    }

    pub fn with_book(self, book: OrderBookSnapshot) -> Self {
        self.state
            .lock()
            .unwrap()
            .books
            .insert(book.symbol.clone(), book);
        self
    }

    pub fn with_candles(self, symbol: &str, interval: CandleInterval, candles: Vec<Candle>) -> Self {
        self.state
            .lock()
            .unwrap()
            .candles
            .insert((symbol.to_string(), interval), candles);
        self
    }

    /// Every call for `symbol` fails.
    pub fn failing(self, symbol: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .failing
            .insert(symbol.to_string());
        self
    }

    /// Every call for `symbol` panics.
    pub fn panicking(self, symbol: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .panicking
            .insert(symbol.to_string());
        self
    }

    /// A fully populated symbol: whale buying, volume spike, flat momentum.
    pub fn with_active_symbol(self, symbol: &str, price: f64) -> Self {
        let mut volumes = vec![100.0; 49];
        volumes.push(1_000.0);

        self.with_price(symbol, price)
            .with_book(book(symbol, 300.0, 100.0))
            .with_candles(symbol, CandleInterval::OneMinute, candles_from_volumes(&volumes))
            .with_candles(
                symbol,
                CandleInterval::FiveMinutes,
                candles_from_closes(&[price; 50]),
            )
            .with_candles(
                symbol,
                CandleInterval::OneDay,
                candles_from_closes(&[price / 1.1, price]),
            )
    }

    fn check(&self, symbol: &str) -> anyhow::Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let state = self.state.lock().unwrap();
        if state.panicking.contains(symbol) {
            drop(state);
            panic!("scripted panic for {}", symbol);
        }
        if state.failing.contains(symbol) {
            anyhow::bail!("Binance API error 400 (code -1121): Invalid symbol.");
        }
        Ok(())
    }
}

#[async_trait]
impl MarketDataProvider for FakeMarket {
    async fn candles(
        &self,
        symbol: &str,
        interval: CandleInterval,
        limit: usize,
    ) -> anyhow::Result<Vec<Candle>> {
        self.check(symbol)?;
        let state = self.state.lock().unwrap();
        let candles = state
            .candles
            .get(&(symbol.to_string(), interval))
            .ok_or_else(|| anyhow::anyhow!("no {} candles for {}", interval, symbol))?;
        let start = candles.len().saturating_sub(limit);
        Ok(candles[start..].to_vec())
    }

    async fn order_book(&self, symbol: &str, _depth: usize) -> anyhow::Result<OrderBookSnapshot> {
        self.check(symbol)?;
        self.state
            .lock()
            .unwrap()
            .books
            .get(symbol)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("no order book for {}", symbol))
    }

    async fn ticker_price(&self, symbol: &str) -> anyhow::Result<f64> {
        self.check(symbol)?;
        self.state
            .lock()
            .unwrap()
            .prices
            .get(symbol)
            .copied()
            .ok_or_else(|| anyhow::anyhow!("no price for {}", symbol))
    }
}

// ============================================================================
// Advisory model
// ============================================================================

/// Replies with a fixed text, optionally after a delay.
pub struct ScriptedModel {
    reply: String,
    delay: Option<Duration>,
    pub prompts: Mutex<Vec<String>>,
}

impl ScriptedModel {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            delay: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn slow(reply: &str, delay: Duration) -> Self {
        Self {
            reply: reply.to_string(),
            delay: Some(delay),
            prompts: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl AdvisoryModel for ScriptedModel {
    fn model_name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, prompt: &str) -> anyhow::Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.reply.clone())
    }
}

// ============================================================================
// Alert transport
// ============================================================================

#[derive(Default)]
pub struct RecordingTransport {
    pub messages: Mutex<Vec<String>>,
    pub fail: AtomicBool,
}

impl RecordingTransport {
    pub fn sent(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl AlertTransport for RecordingTransport {
    async fn send(&self, message: &str) -> anyhow::Result<()> {
        self.messages.lock().unwrap().push(message.to_string());
        if self.fail.load(Ordering::SeqCst) {
            anyhow::bail!("chat API returned 502 Bad Gateway");
        }
        Ok(())
    }
}

// ============================================================================
// Liquidity
// ============================================================================

pub struct FixedLiquidity(pub Option<f64>);

#[async_trait]
impl LiquidityLookup for FixedLiquidity {
    async fn liquidity_usd(&self, _symbol: &str) -> anyhow::Result<Option<f64>> {
        Ok(self.0)
    }
}

// ============================================================================
// Assembly
// ============================================================================

pub struct Pipeline {
    pub monitor: MonitorLoop,
    pub store: Arc<WhaleSignalStore>,
    pub transport: Arc<RecordingTransport>,
    pub alerts: Arc<AlertDeduplicator>,
}

pub fn pipeline(
    symbols: &[&str],
    market: Arc<FakeMarket>,
    model: Arc<ScriptedModel>,
    inference_timeout: Duration,
) -> Pipeline {
    let store = Arc::new(WhaleSignalStore::default());
    let transport = Arc::new(RecordingTransport::default());
    let alerts = Arc::new(AlertDeduplicator::new(
        transport.clone(),
        Duration::from_secs(300),
        0.70,
    ));

    let monitor = MonitorLoop::new(
        symbols.iter().map(|s| s.to_string()).collect(),
        FeatureExtractor::new(market),
        DecisionEngine::new(model, ParseMode::Lenient).with_timeout(inference_timeout),
        alerts.clone(),
        store.clone(),
        Duration::from_secs(60),
    );

    Pipeline {
        monitor,
        store,
        transport,
        alerts,
    }
}

pub fn app_state(market: Arc<FakeMarket>, liquidity: Option<f64>) -> AppState {
    AppState {
        whale_signals: Arc::new(WhaleSignalStore::default()),
        memecoin_signals: Arc::new(MemecoinSignalStore::default()),
        market_data: market.clone(),
        memecoin_scorer: Arc::new(MemecoinScorer::new(
            market,
            Arc::new(FixedLiquidity(liquidity)),
        )),
    }
}
