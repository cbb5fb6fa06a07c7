//! Order book snapshot types.

use serde::{Deserialize, Serialize};

/// A single price level in an order book.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBookLevel {
    /// Price at this level
    pub price: f64,
    /// Total quantity available at this price
    pub quantity: f64,
}

/// Top-of-book snapshot for one symbol.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderBookSnapshot {
    pub symbol: String,
    /// Bid levels, best first
    pub bids: Vec<OrderBookLevel>,
    /// Ask levels, best first
    pub asks: Vec<OrderBookLevel>,
}

impl OrderBookSnapshot {
    /// Sum of quantities across all bid levels.
    pub fn bid_volume(&self) -> f64 {
        self.bids.iter().map(|l| l.quantity).sum()
    }

    /// Sum of quantities across all ask levels.
    pub fn ask_volume(&self) -> f64 {
        self.asks.iter().map(|l| l.quantity).sum()
    }
}
