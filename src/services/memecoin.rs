//! Memecoin risk scoring from volatility, pump activity and liquidity.

use crate::services::round_dp;
use crate::sources::{LiquidityLookup, MarketDataProvider};
use crate::types::{
    Candle, CandleInterval, Degraded, LiquidityReading, MemecoinScore, PumpReading, Reading,
    RiskLevel, VolatilityLevel, VolatilityReading,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

const VOLATILITY_CANDLES: usize = 24;
const PUMP_CANDLES: usize = 100;
const PUMP_WINDOW: usize = 20;
const LIQUIDITY_TIMEOUT: Duration = Duration::from_secs(5);

/// Hourly volatility (percent) above which a symbol behaves like a memecoin.
pub const MEMECOIN_VOLATILITY: f64 = 10.0;
/// Short-window spread (percent) above which a pump is flagged.
pub const PUMP_THRESHOLD: f64 = 50.0;
/// Pool liquidity (USD) below which liquidity is flagged as low.
pub const LOW_LIQUIDITY_USD: f64 = 50_000.0;

const VOLATILITY_POINTS: u32 = 30;
const PUMP_POINTS: u32 = 5;
// Low liquidity is reported but never scored.
const LIQUIDITY_POINTS: u32 = 0;

/// Population standard deviation of close-to-close returns, in percent.
pub fn volatility_from(candles: &[Candle]) -> Result<VolatilityReading, Degraded> {
    if candles.len() < 2 {
        return Err(Degraded::InsufficientData {
            required: 2,
            available: candles.len(),
        });
    }
    if candles.iter().any(|c| c.close == 0.0) {
        return Err(Degraded::InvalidData("zero close price".to_string()));
    }

    let returns: Vec<f64> = candles
        .windows(2)
        .map(|w| (w[1].close - w[0].close) / w[0].close)
        .collect();
    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
    let volatility = variance.sqrt() * 100.0;

    Ok(VolatilityReading {
        hourly_volatility: round_dp(volatility, 2),
        is_memecoin: volatility > MEMECOIN_VOLATILITY,
        level: VolatilityLevel::from_volatility(volatility),
    })
}

/// Max/min spread of the last 20 closes, in percent.
pub fn pump_from(candles: &[Candle]) -> Result<PumpReading, Degraded> {
    if candles.is_empty() {
        return Err(Degraded::InsufficientData {
            required: 1,
            available: 0,
        });
    }

    let window = &candles[candles.len().saturating_sub(PUMP_WINDOW)..];
    let max = window.iter().map(|c| c.close).fold(f64::MIN, f64::max);
    let min = window.iter().map(|c| c.close).fold(f64::MAX, f64::min);
    if min <= 0.0 {
        return Err(Degraded::InvalidData("non-positive close price".to_string()));
    }

    let pump_percentage = (max - min) / min * 100.0;
    Ok(PumpReading {
        pump_detected: pump_percentage > PUMP_THRESHOLD,
        pump_percentage: round_dp(pump_percentage, 2),
    })
}

pub fn liquidity_from(liquidity_usd: f64) -> LiquidityReading {
    LiquidityReading {
        liquidity: liquidity_usd.round(),
        low_liquidity: liquidity_usd < LOW_LIQUIDITY_USD,
    }
}

/// Combine sub-results into a score. Missing sub-results contribute nothing.
pub fn tally(
    symbol: &str,
    volatility: Option<VolatilityReading>,
    pump: Option<PumpReading>,
    liquidity: Option<LiquidityReading>,
) -> MemecoinScore {
    let mut total_score = 0;
    if volatility.as_ref().map_or(false, |v| v.is_memecoin) {
        total_score += VOLATILITY_POINTS;
    }
    if pump.as_ref().map_or(false, |p| p.pump_detected) {
        total_score += PUMP_POINTS;
    }
    if liquidity.as_ref().map_or(false, |l| l.low_liquidity) {
        total_score += LIQUIDITY_POINTS;
    }

    MemecoinScore {
        symbol: symbol.to_string(),
        total_score,
        is_memecoin: total_score > 50,
        risk: RiskLevel::from_score(total_score),
        volatility,
        pump,
        liquidity,
    }
}

/// Scores symbols on demand.
#[derive(Clone)]
pub struct MemecoinScorer {
    market_data: Arc<dyn MarketDataProvider>,
    liquidity: Arc<dyn LiquidityLookup>,
}

impl MemecoinScorer {
    pub fn new(market_data: Arc<dyn MarketDataProvider>, liquidity: Arc<dyn LiquidityLookup>) -> Self {
        Self {
            market_data,
            liquidity,
        }
    }

    pub async fn volatility_score(&self, symbol: &str) -> Reading<VolatilityReading> {
        match self
            .market_data
            .candles(symbol, CandleInterval::OneHour, VOLATILITY_CANDLES)
            .await
        {
            Ok(candles) => volatility_from(&candles).into(),
            Err(e) => Reading::Degraded(Degraded::provider(e)),
        }
    }

    pub async fn pump_score(&self, symbol: &str) -> Reading<PumpReading> {
        match self
            .market_data
            .candles(symbol, CandleInterval::OneMinute, PUMP_CANDLES)
            .await
        {
            Ok(candles) => pump_from(&candles).into(),
            Err(e) => Reading::Degraded(Degraded::provider(e)),
        }
    }

    pub async fn liquidity_score(&self, symbol: &str) -> Reading<LiquidityReading> {
        match tokio::time::timeout(LIQUIDITY_TIMEOUT, self.liquidity.liquidity_usd(symbol)).await {
            Ok(Ok(Some(usd))) => Reading::Ok(liquidity_from(usd)),
            Ok(Ok(None)) => Reading::Degraded(Degraded::MissingData(format!(
                "no liquidity pool found for {}",
                symbol
            ))),
            Ok(Err(e)) => Reading::Degraded(Degraded::provider(e)),
            Err(_) => Reading::Degraded(Degraded::provider("liquidity lookup timed out")),
        }
    }

    /// Composite score for `symbol`.
    pub async fn score(&self, symbol: &str) -> MemecoinScore {
        let volatility = self.volatility_score(symbol).await;
        let pump = self.pump_score(symbol).await;
        let liquidity = self.liquidity_score(symbol).await;

        for (name, reason) in [
            ("volatility", volatility.degraded_reason()),
            ("pump", pump.degraded_reason()),
            ("liquidity", liquidity.degraded_reason()),
        ] {
            if let Some(reason) = reason {
                debug!("{} {} unavailable: {}", symbol, name, reason);
            }
        }

        let score = tally(symbol, volatility.ok(), pump.ok(), liquidity.ok());
        info!(
            "Memecoin score for {}: {} ({:?})",
            symbol, score.total_score, score.risk
        );
        score
    }
}
