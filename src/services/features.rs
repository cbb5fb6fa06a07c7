//! Microstructure feature extraction.
//!
//! Turns raw candle and order-book series into classified micro-signals.
//! Provider failures and short series never propagate: they come back as
//! [`Reading::Degraded`] and classify as `N/A`.

use crate::services::round_dp;
use crate::sources::MarketDataProvider;
use crate::types::{
    Candle, CandleInterval, Degraded, MarketFeatures, Momentum, MomentumSignal,
    OrderBookSnapshot, OrderbookImbalance, PriceSnapshot, Reading, VolumeSignal, VolumeSpike,
    WhaleIndicator,
};
use std::sync::Arc;
use tracing::{debug, warn};

/// Order book levels fetched per side.
pub const ORDERBOOK_DEPTH: usize = 50;
/// Candles fetched for volume and momentum analysis.
pub const FEATURE_CANDLES: usize = 50;
/// Window of volumes averaged for the spike ratio.
pub const VOLUME_WINDOW: usize = 20;
/// Minimum five-minute candles for RSI.
pub const MOMENTUM_MIN_CANDLES: usize = 12;
/// RSI lookback.
pub const RSI_PERIOD: usize = 14;

/// Classify an order book's bid/ask volume imbalance.
///
/// A book with no ask volume has ratio 0 and is classified BALANCED.
pub fn classify_imbalance(bid_volume: f64, ask_volume: f64) -> OrderbookImbalance {
    let (ratio, signal) = if ask_volume > 0.0 {
        let ratio = bid_volume / ask_volume;
        (ratio, WhaleIndicator::from_ratio(ratio))
    } else {
        (0.0, WhaleIndicator::Balanced)
    };

    OrderbookImbalance {
        bid_volume,
        ask_volume,
        bid_ask_ratio: round_dp(ratio, 3),
        signal,
    }
}

pub fn imbalance_from_book(book: &OrderBookSnapshot) -> OrderbookImbalance {
    classify_imbalance(book.bid_volume(), book.ask_volume())
}

/// Latest quote volume against the mean of the last 20 (latest included).
pub fn volume_spike_from(candles: &[Candle]) -> Result<VolumeSpike, Degraded> {
    if candles.len() < VOLUME_WINDOW {
        return Err(Degraded::InsufficientData {
            required: VOLUME_WINDOW,
            available: candles.len(),
        });
    }

    let window = &candles[candles.len() - VOLUME_WINDOW..];
    let mean = window.iter().map(|c| c.quote_volume).sum::<f64>() / VOLUME_WINDOW as f64;
    let latest = window[VOLUME_WINDOW - 1].quote_volume;
    let ratio = if mean > 0.0 { latest / mean } else { 0.0 };

    Ok(VolumeSpike {
        spike_ratio: round_dp(ratio, 2),
        signal: VolumeSignal::from_ratio(ratio),
    })
}

/// Simple-average RSI over the most recent 14 closing deltas.
///
/// Gains and losses are averaged separately over the trailing window (or
/// over every delta when fewer exist). When either average is zero the
/// relative strength is taken as 0 and the RSI reported as 50.
pub fn relative_strength_index(closes: &[f64]) -> f64 {
    let deltas: Vec<f64> = closes.windows(2).map(|w| w[1] - w[0]).collect();
    if deltas.is_empty() {
        return 50.0;
    }

    let recent = &deltas[deltas.len().saturating_sub(RSI_PERIOD)..];
    let n = recent.len() as f64;
    let avg_gain = recent.iter().map(|d| d.max(0.0)).sum::<f64>() / n;
    let avg_loss = recent.iter().map(|d| (-d).max(0.0)).sum::<f64>() / n;

    let rs = if avg_loss != 0.0 { avg_gain / avg_loss } else { 0.0 };
    if rs > 0.0 {
        100.0 - 100.0 / (1.0 + rs)
    } else {
        50.0
    }
}

pub fn momentum_from(candles: &[Candle]) -> Result<Momentum, Degraded> {
    if candles.len() < MOMENTUM_MIN_CANDLES {
        return Err(Degraded::InsufficientData {
            required: MOMENTUM_MIN_CANDLES,
            available: candles.len(),
        });
    }

    let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
    let rsi = relative_strength_index(&closes);

    Ok(Momentum {
        rsi: round_dp(rsi, 2),
        signal: MomentumSignal::from_rsi(rsi),
    })
}

/// Percent change of `price` against the previous daily close.
///
/// `daily` holds the last two daily candles, oldest first; with fewer the
/// change is 0.
pub fn change_24h(price: f64, daily: &[Candle]) -> f64 {
    if daily.len() < 2 {
        return 0.0;
    }
    let prev = daily[0].close;
    if prev == 0.0 {
        return 0.0;
    }
    round_dp((price - prev) / prev * 100.0, 2)
}

/// Extracts features for a symbol from a market-data provider.
#[derive(Clone)]
pub struct FeatureExtractor {
    provider: Arc<dyn MarketDataProvider>,
}

impl FeatureExtractor {
    pub fn new(provider: Arc<dyn MarketDataProvider>) -> Self {
        Self { provider }
    }

    /// Order book imbalance over the top 50 levels.
    pub async fn orderbook_imbalance(&self, symbol: &str) -> Reading<OrderbookImbalance> {
        let reading: Reading<OrderbookImbalance> =
            match self.provider.order_book(symbol, ORDERBOOK_DEPTH).await {
                Ok(book) => Reading::Ok(imbalance_from_book(&book)),
                Err(e) => Reading::Degraded(Degraded::provider(e)),
            };
        log_degraded(symbol, "orderbook", &reading);
        reading
    }

    /// Volume spike over the last 50 one-minute candles.
    pub async fn volume_spike(&self, symbol: &str) -> Reading<VolumeSpike> {
        let reading: Reading<VolumeSpike> = match self
            .provider
            .candles(symbol, CandleInterval::OneMinute, FEATURE_CANDLES)
            .await
        {
            Ok(candles) => volume_spike_from(&candles).into(),
            Err(e) => Reading::Degraded(Degraded::provider(e)),
        };
        log_degraded(symbol, "volume", &reading);
        reading
    }

    /// RSI momentum over the last 50 five-minute candles.
    pub async fn momentum(&self, symbol: &str) -> Reading<Momentum> {
        let reading: Reading<Momentum> = match self
            .provider
            .candles(symbol, CandleInterval::FiveMinutes, FEATURE_CANDLES)
            .await
        {
            Ok(candles) => momentum_from(&candles).into(),
            Err(e) => Reading::Degraded(Degraded::provider(e)),
        };
        log_degraded(symbol, "momentum", &reading);
        reading
    }

    /// Current price and 24h change.
    pub async fn price_snapshot(&self, symbol: &str) -> Reading<PriceSnapshot> {
        let price = match self.provider.ticker_price(symbol).await {
            Ok(price) => price,
            Err(e) => {
                let reading = Reading::Degraded(Degraded::provider(e));
                log_degraded(symbol, "price", &reading);
                return reading;
            }
        };

        let change = match self
            .provider
            .candles(symbol, CandleInterval::OneDay, 2)
            .await
        {
            Ok(daily) => change_24h(price, &daily),
            Err(e) => {
                let reading = Reading::Degraded(Degraded::provider(e));
                log_degraded(symbol, "price", &reading);
                return reading;
            }
        };

        Reading::Ok(PriceSnapshot {
            price,
            change_24h: change,
        })
    }

    /// All three micro-signals, fetched one after another.
    pub async fn extract(&self, symbol: &str) -> MarketFeatures {
        let orderbook = self.orderbook_imbalance(symbol).await;
        let volume = self.volume_spike(symbol).await;
        let momentum = self.momentum(symbol).await;

        let features = MarketFeatures {
            orderbook,
            volume,
            momentum,
        };

        debug!(
            "{} features: orderbook={} volume={} momentum={}",
            symbol,
            features.whale_signal().as_str(),
            features.volume_signal().as_str(),
            features.momentum_signal().as_str()
        );

        features
    }
}

fn log_degraded<T>(symbol: &str, feature: &str, reading: &Reading<T>) {
    if let Some(reason) = reading.degraded_reason() {
        match reason {
            Degraded::Provider(_) => warn!("{} {} unavailable: {}", symbol, feature, reason),
            _ => debug!("{} {} unavailable: {}", symbol, feature, reason),
        }
    }
}
