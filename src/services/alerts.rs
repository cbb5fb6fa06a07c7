//! Per-symbol cooldown gate in front of the alert transport.

use crate::services::decision::format_usd;
use crate::sources::AlertTransport;
use crate::types::{Action, Decision, MarketFeatures, PriceSnapshot};
use chrono::{DateTime, Local, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default minimum time between two alerts for one symbol.
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(300);
/// Default minimum confidence for an actionable decision to alert.
pub const DEFAULT_MIN_CONFIDENCE: f64 = 0.70;
/// Upper bound on a single delivery attempt.
pub const DELIVERY_TIMEOUT: Duration = Duration::from_secs(10);

/// What happened to a decision at the alert gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlertOutcome {
    /// HOLD, or confidence below the threshold.
    NotQualifying,
    /// No transport configured.
    Disabled,
    /// Within the cooldown window of the previous attempt.
    Suppressed,
    Delivered,
    Failed(String),
}

/// HTML alert body for a qualifying decision.
pub fn format_alert_message(
    symbol: &str,
    price: &PriceSnapshot,
    decision: &Decision,
    features: &MarketFeatures,
    at: DateTime<Local>,
) -> String {
    let emoji = match decision.action {
        Action::Buy => "🚀",
        Action::Sell => "📉",
        Action::Hold => "⏸️",
    };

    format!(
        "{emoji} <b>WHALE ALERT: {symbol}</b>\n\
         \n\
         <b>Price:</b> ${price}\n\
         <b>24h Change:</b> {change:+.2}%\n\
         \n\
         <b>Signal:</b> <code>{action}</code>\n\
         <b>Confidence:</b> {confidence:.0}%\n\
         \n\
         <b>Signals:</b>\n\
         - Orderbook: {orderbook}\n\
         - Volume: {volume}\n\
         - Momentum: {momentum}\n\
         \n\
         ⏰ {time}",
        emoji = emoji,
        symbol = symbol,
        price = format_usd(price.price),
        change = price.change_24h,
        action = decision.action,
        confidence = decision.confidence * 100.0,
        orderbook = features.whale_signal().as_str(),
        volume = features.volume_signal().as_str(),
        momentum = features.momentum_signal().as_str(),
        time = at.format("%Y-%m-%d %H:%M:%S"),
    )
}

/// Gates alert delivery on decision quality and a per-symbol cooldown.
///
/// The cooldown entry for a symbol is written before the transport is
/// called, so a failed delivery still consumes the window.
pub struct AlertDeduplicator {
    transport: Arc<dyn AlertTransport>,
    last_alert: DashMap<String, DateTime<Utc>>,
    cooldown_ms: i64,
    min_confidence: f64,
}

impl AlertDeduplicator {
    pub fn new(transport: Arc<dyn AlertTransport>, cooldown: Duration, min_confidence: f64) -> Self {
        Self {
            transport,
            last_alert: DashMap::new(),
            cooldown_ms: i64::try_from(cooldown.as_millis()).unwrap_or(i64::MAX),
            min_confidence,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.transport.is_enabled()
    }

    /// Actionable and confident enough to alert on.
    pub fn qualifies(&self, decision: &Decision) -> bool {
        decision.action != Action::Hold && decision.confidence >= self.min_confidence
    }

    /// Last attempted alert for a symbol.
    pub fn last_alert(&self, symbol: &str) -> Option<DateTime<Utc>> {
        self.last_alert.get(symbol).map(|entry| *entry.value())
    }

    /// Record `now` for `symbol` unless it is still cooling down.
    ///
    /// Returns false when the previous attempt is less than one cooldown ago.
    pub fn try_claim(&self, symbol: &str, now: DateTime<Utc>) -> bool {
        match self.last_alert.entry(symbol.to_string()) {
            Entry::Occupied(mut entry) => {
                let elapsed = (now - *entry.get()).num_milliseconds();
                if elapsed < self.cooldown_ms {
                    return false;
                }
                entry.insert(now);
                true
            }
            Entry::Vacant(entry) => {
                entry.insert(now);
                true
            }
        }
    }

    pub async fn dispatch(&self, symbol: &str, decision: &Decision, message: &str) -> AlertOutcome {
        self.dispatch_at(symbol, decision, message, Utc::now()).await
    }

    /// Run the gate for one decision as of `now`.
    pub async fn dispatch_at(
        &self,
        symbol: &str,
        decision: &Decision,
        message: &str,
        now: DateTime<Utc>,
    ) -> AlertOutcome {
        if !self.qualifies(decision) {
            return AlertOutcome::NotQualifying;
        }

        if !self.transport.is_enabled() {
            debug!("{} qualifies for an alert but no transport is configured", symbol);
            return AlertOutcome::Disabled;
        }

        if !self.try_claim(symbol, now) {
            debug!("{} alert suppressed by cooldown", symbol);
            return AlertOutcome::Suppressed;
        }

        let outcome = self.deliver(message).await;
        match &outcome {
            AlertOutcome::Delivered => info!("Alert sent for {}: {}", symbol, decision.action),
            AlertOutcome::Failed(reason) => warn!("Alert for {} failed: {}", symbol, reason),
            _ => {}
        }
        outcome
    }

    /// Send a message that bypasses the qualification and cooldown checks.
    pub async fn announce(&self, message: &str) -> AlertOutcome {
        if !self.transport.is_enabled() {
            return AlertOutcome::Disabled;
        }
        self.deliver(message).await
    }

    async fn deliver(&self, message: &str) -> AlertOutcome {
        match tokio::time::timeout(DELIVERY_TIMEOUT, self.transport.send(message)).await {
            Ok(Ok(())) => AlertOutcome::Delivered,
            Ok(Err(e)) => AlertOutcome::Failed(e.to_string()),
            Err(_) => AlertOutcome::Failed(format!(
                "delivery timed out after {}s",
                DELIVERY_TIMEOUT.as_secs()
            )),
        }
    }
}
