//! Memecoin risk scoring types.

use serde::{Deserialize, Serialize};

/// Overall memecoin risk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Medium,
    High,
    Extreme,
}

impl RiskLevel {
    /// Risk bucket for a composite score.
    pub fn from_score(total_score: u32) -> Self {
        if total_score > 80 {
            RiskLevel::Extreme
        } else if total_score > 50 {
            RiskLevel::High
        } else {
            RiskLevel::Medium
        }
    }
}

/// Hourly volatility bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VolatilityLevel {
    Extreme,
    VeryHigh,
    High,
}

impl VolatilityLevel {
    pub fn from_volatility(volatility_pct: f64) -> Self {
        if volatility_pct > 20.0 {
            VolatilityLevel::Extreme
        } else if volatility_pct > 10.0 {
            VolatilityLevel::VeryHigh
        } else {
            VolatilityLevel::High
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolatilityReading {
    /// Std-dev of hourly returns in percent, rounded to 2 decimals
    pub hourly_volatility: f64,
    pub is_memecoin: bool,
    pub level: VolatilityLevel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PumpReading {
    pub pump_detected: bool,
    /// Max/min spread over the recent window in percent, rounded to 2 decimals
    pub pump_percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiquidityReading {
    /// Pool liquidity in USD, rounded to whole dollars
    pub liquidity: f64,
    pub low_liquidity: bool,
}

/// Composite memecoin score for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemecoinScore {
    pub symbol: String,
    pub total_score: u32,
    pub is_memecoin: bool,
    pub risk: RiskLevel,
    pub volatility: Option<VolatilityReading>,
    pub pump: Option<PumpReading>,
    pub liquidity: Option<LiquidityReading>,
}
