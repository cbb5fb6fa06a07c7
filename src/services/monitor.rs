//! Periodic monitor loop driving the whale signal pipeline.
//!
//! Each pass walks the configured symbols in order: price snapshot,
//! features, advisory decision, store append, alert gate. A symbol is
//! evaluated in its own task so an error or panic while evaluating it is
//! logged and the pass moves on to the next symbol.

use crate::services::alerts::{format_alert_message, AlertDeduplicator, AlertOutcome};
use crate::services::decision::DecisionEngine;
use crate::services::features::FeatureExtractor;
use crate::services::signal_store::WhaleSignalStore;
use crate::types::{Decision, MarketFeatures, PriceSnapshot, WhaleSignalInput};
use chrono::{DateTime, Local};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, info_span, Instrument};
use uuid::Uuid;

/// Result of evaluating one symbol.
#[derive(Debug, Clone)]
pub struct SymbolReport {
    pub symbol: String,
    pub price: PriceSnapshot,
    pub features: MarketFeatures,
    pub decision: Decision,
    /// Id of the stored signal.
    pub signal_id: u64,
    pub alert: AlertOutcome,
}

/// Result of one pass over all symbols.
#[derive(Debug, Clone)]
pub struct PassReport {
    pub pass_id: Uuid,
    pub reports: Vec<SymbolReport>,
    /// Symbols whose evaluation aborted, with the reason.
    pub failures: Vec<(String, String)>,
}

impl PassReport {
    pub fn report(&self, symbol: &str) -> Option<&SymbolReport> {
        self.reports.iter().find(|r| r.symbol == symbol)
    }
}

/// Startup notice sent once when alerts are enabled.
pub fn startup_message(symbol_count: usize, model: &str, at: DateTime<Local>) -> String {
    format!(
        "✅ <b>Whale Monitor Started</b>\n\
         \n\
         🐋 <b>Monitoring:</b> {} tokens\n\
         🤖 <b>Model:</b> {}\n\
         ⏰ <b>Time:</b> {}\n\
         \n\
         Ready to detect whale activity!",
        symbol_count,
        model,
        at.format("%Y-%m-%d %H:%M:%S")
    )
}

#[derive(Clone)]
pub struct MonitorLoop {
    symbols: Arc<Vec<String>>,
    features: FeatureExtractor,
    decisions: DecisionEngine,
    alerts: Arc<AlertDeduplicator>,
    store: Arc<WhaleSignalStore>,
    interval: Duration,
}

impl MonitorLoop {
    pub fn new(
        symbols: Vec<String>,
        features: FeatureExtractor,
        decisions: DecisionEngine,
        alerts: Arc<AlertDeduplicator>,
        store: Arc<WhaleSignalStore>,
        interval: Duration,
    ) -> Self {
        Self {
            symbols: Arc::new(symbols),
            features,
            decisions,
            alerts,
            store,
            interval,
        }
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    /// Announce startup, then run passes forever with `interval` between them.
    pub async fn run(self) {
        info!(
            "Monitoring {} every {}s ({:?} reply parsing)",
            self.symbols().join(", "),
            self.interval.as_secs(),
            self.decisions.parse_mode()
        );

        if self.alerts.is_enabled() {
            let message = startup_message(
                self.symbols.len(),
                self.decisions.model_name(),
                Local::now(),
            );
            if let AlertOutcome::Failed(reason) = self.alerts.announce(&message).await {
                error!("Failed to send startup message: {}", reason);
            }
        }

        loop {
            let pass = self.run_pass().await;
            info!(
                "Pass {} complete: {} evaluated, {} failed",
                pass.pass_id,
                pass.reports.len(),
                pass.failures.len()
            );
            tokio::time::sleep(self.interval).await;
        }
    }

    /// Evaluate every symbol once, in order.
    pub async fn run_pass(&self) -> PassReport {
        let pass_id = Uuid::new_v4();
        let span = info_span!("monitor_pass", pass_id = %pass_id);

        async move {
            let mut reports = Vec::with_capacity(self.symbols.len());
            let mut failures = Vec::new();

            for symbol in self.symbols.iter() {
                let monitor = self.clone();
                let sym = symbol.clone();
                let task = tokio::spawn(
                    async move { monitor.process_symbol(&sym).await }.in_current_span(),
                );

                match task.await {
                    Ok(report) => reports.push(report),
                    Err(e) => {
                        let reason = if e.is_panic() {
                            "evaluation panicked".to_string()
                        } else {
                            e.to_string()
                        };
                        error!("Error evaluating {}: {}", symbol, reason);
                        failures.push((symbol.clone(), reason));
                    }
                }
            }

            PassReport {
                pass_id,
                reports,
                failures,
            }
        }
        .instrument(span)
        .await
    }

    /// Run the full pipeline for one symbol.
    pub async fn process_symbol(&self, symbol: &str) -> SymbolReport {
        let price = self.features.price_snapshot(symbol).await.value_or_default();
        info!(
            "{} ${:.2} ({:+.2}% 24h)",
            symbol, price.price, price.change_24h
        );

        let features = self.features.extract(symbol).await;
        info!(
            "{} Orderbook: {} | Volume: {} | Momentum: {}",
            symbol,
            features.whale_signal().as_str(),
            features.volume_signal().as_str(),
            features.momentum_signal().as_str()
        );

        let decision = self.decisions.decide(symbol, &price, &features).await;
        info!(
            "{} {} ({:.0}% confidence)",
            symbol,
            decision.action,
            decision.confidence * 100.0
        );

        let signal = self.store.append(WhaleSignalInput::from_decision(
            symbol,
            price,
            decision,
            features.whale_signal(),
        ));

        let alert = if self.alerts.qualifies(&decision) {
            let message = format_alert_message(symbol, &price, &decision, &features, Local::now());
            self.alerts.dispatch(symbol, &decision, &message).await
        } else {
            AlertOutcome::NotQualifying
        };

        SymbolReport {
            symbol: symbol.to_string(),
            price,
            features,
            decision,
            signal_id: signal.id,
            alert,
        }
    }
}
