//! Microstructure feature types.
//!
//! Every feature is produced as a [`Reading`]: either a computed value or a
//! [`Degraded`] reason explaining why the value is unavailable. A degraded
//! reading classifies as `N/A` and never aborts the pipeline.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Bid/ask ratio above which the book is classified as whale buying.
pub const WHALE_BUY_RATIO: f64 = 1.2;
/// Bid/ask ratio below which the book is classified as whale selling.
pub const WHALE_SELL_RATIO: f64 = 0.83;
/// Latest-to-mean volume ratio above which volume is a spike.
pub const VOLUME_SPIKE_RATIO: f64 = 2.0;
pub const RSI_OVERBOUGHT: f64 = 70.0;
pub const RSI_OVERSOLD: f64 = 30.0;

/// Why a reading could not be produced.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Degraded {
    #[error("provider error: {0}")]
    Provider(String),

    #[error("insufficient data: need {required}, got {available}")]
    InsufficientData { required: usize, available: usize },

    #[error("missing data: {0}")]
    MissingData(String),

    #[error("invalid data: {0}")]
    InvalidData(String),
}

impl Degraded {
    pub fn provider(err: impl std::fmt::Display) -> Self {
        Degraded::Provider(err.to_string())
    }
}

/// Result of an external-data computation that must never fail loudly.
#[derive(Debug, Clone, PartialEq)]
pub enum Reading<T> {
    Ok(T),
    Degraded(Degraded),
}

impl<T> Reading<T> {
    pub fn ok(self) -> Option<T> {
        match self {
            Reading::Ok(value) => Some(value),
            Reading::Degraded(_) => None,
        }
    }

    pub fn as_ok(&self) -> Option<&T> {
        match self {
            Reading::Ok(value) => Some(value),
            Reading::Degraded(_) => None,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Reading::Degraded(_))
    }

    pub fn degraded_reason(&self) -> Option<&Degraded> {
        match self {
            Reading::Ok(_) => None,
            Reading::Degraded(reason) => Some(reason),
        }
    }
}

impl<T: Default> Reading<T> {
    /// The value, or the type's default when degraded.
    pub fn value_or_default(self) -> T {
        self.ok().unwrap_or_default()
    }
}

impl<T> From<Result<T, Degraded>> for Reading<T> {
    fn from(result: Result<T, Degraded>) -> Self {
        match result {
            Ok(value) => Reading::Ok(value),
            Err(reason) => Reading::Degraded(reason),
        }
    }
}

// ============================================================================
// Classification labels
// ============================================================================

/// Order book imbalance classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WhaleIndicator {
    WhaleBuy,
    WhaleSell,
    Balanced,
    #[serde(rename = "N/A")]
    NotAvailable,
}

impl WhaleIndicator {
    /// Classify a bid/ask volume ratio.
    pub fn from_ratio(ratio: f64) -> Self {
        if ratio > WHALE_BUY_RATIO {
            WhaleIndicator::WhaleBuy
        } else if ratio < WHALE_SELL_RATIO {
            WhaleIndicator::WhaleSell
        } else {
            WhaleIndicator::Balanced
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WhaleIndicator::WhaleBuy => "WHALE_BUY",
            WhaleIndicator::WhaleSell => "WHALE_SELL",
            WhaleIndicator::Balanced => "BALANCED",
            WhaleIndicator::NotAvailable => "N/A",
        }
    }
}

/// Volume classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VolumeSignal {
    VolumeSpike,
    Normal,
    #[serde(rename = "N/A")]
    NotAvailable,
}

impl VolumeSignal {
    pub fn from_ratio(ratio: f64) -> Self {
        if ratio > VOLUME_SPIKE_RATIO {
            VolumeSignal::VolumeSpike
        } else {
            VolumeSignal::Normal
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            VolumeSignal::VolumeSpike => "VOLUME_SPIKE",
            VolumeSignal::Normal => "NORMAL",
            VolumeSignal::NotAvailable => "N/A",
        }
    }
}

/// Momentum classification derived from RSI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MomentumSignal {
    StrongUp,
    StrongDown,
    Neutral,
    #[serde(rename = "N/A")]
    NotAvailable,
}

impl MomentumSignal {
    pub fn from_rsi(rsi: f64) -> Self {
        if rsi > RSI_OVERBOUGHT {
            MomentumSignal::StrongUp
        } else if rsi < RSI_OVERSOLD {
            MomentumSignal::StrongDown
        } else {
            MomentumSignal::Neutral
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MomentumSignal::StrongUp => "STRONG_UP",
            MomentumSignal::StrongDown => "STRONG_DOWN",
            MomentumSignal::Neutral => "NEUTRAL",
            MomentumSignal::NotAvailable => "N/A",
        }
    }
}

// ============================================================================
// Feature values
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderbookImbalance {
    pub bid_volume: f64,
    pub ask_volume: f64,
    /// Bid/ask ratio rounded to 3 decimals
    pub bid_ask_ratio: f64,
    pub signal: WhaleIndicator,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeSpike {
    /// Latest-to-mean ratio rounded to 2 decimals
    pub spike_ratio: f64,
    pub signal: VolumeSignal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Momentum {
    /// RSI rounded to 2 decimals
    pub rsi: f64,
    pub signal: MomentumSignal,
}

/// Current price and its change against the previous daily close.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceSnapshot {
    pub price: f64,
    /// Percent change, rounded to 2 decimals
    pub change_24h: f64,
}

/// The three micro-signals extracted for one symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct MarketFeatures {
    pub orderbook: Reading<OrderbookImbalance>,
    pub volume: Reading<VolumeSpike>,
    pub momentum: Reading<Momentum>,
}

impl MarketFeatures {
    pub fn whale_signal(&self) -> WhaleIndicator {
        self.orderbook
            .as_ok()
            .map(|o| o.signal)
            .unwrap_or(WhaleIndicator::NotAvailable)
    }

    pub fn volume_signal(&self) -> VolumeSignal {
        self.volume
            .as_ok()
            .map(|v| v.signal)
            .unwrap_or(VolumeSignal::NotAvailable)
    }

    pub fn momentum_signal(&self) -> MomentumSignal {
        self.momentum
            .as_ok()
            .map(|m| m.signal)
            .unwrap_or(MomentumSignal::NotAvailable)
    }
}
