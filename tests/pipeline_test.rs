//! Monitor pipeline tests: feature extraction through store and alert gate,
//! driven by in-memory collaborators.

mod common;

use chrono::{TimeZone, Utc};
use common::{pipeline, FakeMarket, ScriptedModel};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use whale_radar::services::AlertOutcome;
use whale_radar::types::{
    Action, Decision, MomentumSignal, VolumeSignal, WhaleIndicator, DEFAULT_CONFIDENCE,
};

const BUY_REPLY: &str = "ACTION: BUY\nCONFIDENCE: 0.82";

// ============================================================================
// Full Pass Tests
// ============================================================================

#[tokio::test]
async fn test_pass_records_signal_and_alerts() {
    let market = Arc::new(FakeMarket::new().with_active_symbol("BTCUSDT", 66_000.0));
    let model = Arc::new(ScriptedModel::replying(BUY_REPLY));
    let p = pipeline(&["BTCUSDT"], market, model.clone(), Duration::from_secs(1));

    let pass = p.monitor.run_pass().await;
    assert!(pass.failures.is_empty());

    let report = pass.report("BTCUSDT").unwrap();
    assert_eq!(report.features.whale_signal(), WhaleIndicator::WhaleBuy);
    assert_eq!(report.features.volume_signal(), VolumeSignal::VolumeSpike);
    assert_eq!(report.features.momentum_signal(), MomentumSignal::Neutral);
    assert_eq!(report.decision, Decision::new(Action::Buy, 0.82));
    assert_eq!(report.alert, AlertOutcome::Delivered);

    let page = p.store.recent(50);
    assert_eq!(page.total, 1);
    let signal = &page.signals[0];
    assert_eq!(signal.id, report.signal_id);
    assert_eq!(signal.symbol.as_deref(), Some("BTCUSDT"));
    assert_eq!(signal.price, Some(66_000.0));
    assert_eq!(signal.change_24h, Some(10.0));
    assert_eq!(signal.action, Some(Action::Buy));
    assert_eq!(signal.whale_signal, Some(WhaleIndicator::WhaleBuy));

    let prompts = model.prompts.lock().unwrap().clone();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].starts_with("Analyze BTCUSDT:\nPRICE: $66,000.00 (24h: +10.00%)"));
    assert!(prompts[0].contains("Orderbook: WHALE_BUY\nVolume: VOLUME_SPIKE\nMomentum: NEUTRAL"));

    let sent = p.transport.sent();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].starts_with("🚀 <b>WHALE ALERT: BTCUSDT</b>"));
    assert!(sent[0].contains("<b>Confidence:</b> 82%"));
}

#[tokio::test]
async fn test_symbols_evaluated_in_configured_order() {
    let market = Arc::new(
        FakeMarket::new()
            .with_active_symbol("BTCUSDT", 66_000.0)
            .with_active_symbol("ETHUSDT", 3_200.0)
            .with_active_symbol("BNBUSDT", 580.0),
    );
    let model = Arc::new(ScriptedModel::replying("HOLD\nCONFIDENCE: 0.4"));
    let p = pipeline(
        &["ETHUSDT", "BNBUSDT", "BTCUSDT"],
        market,
        model,
        Duration::from_secs(1),
    );

    assert_eq!(p.monitor.symbols(), ["ETHUSDT", "BNBUSDT", "BTCUSDT"]);
    p.monitor.run_pass().await;

    let symbols: Vec<_> = p
        .store
        .recent(0)
        .signals
        .into_iter()
        .map(|s| s.symbol.unwrap_or_default())
        .collect();
    assert_eq!(symbols, vec!["ETHUSDT", "BNBUSDT", "BTCUSDT"]);
    assert!(p.transport.sent().is_empty());
}

// ============================================================================
// Degradation Tests
// ============================================================================

#[tokio::test]
async fn test_inference_timeout_records_hold_without_alert() {
    let market = Arc::new(FakeMarket::new().with_active_symbol("BTCUSDT", 66_000.0));
    let model = Arc::new(ScriptedModel::slow(BUY_REPLY, Duration::from_millis(500)));
    let p = pipeline(&["BTCUSDT"], market, model, Duration::from_millis(20));

    let pass = p.monitor.run_pass().await;
    let report = pass.report("BTCUSDT").unwrap();

    assert_eq!(report.decision.action, Action::Hold);
    assert_eq!(report.decision.confidence, DEFAULT_CONFIDENCE);
    assert_eq!(report.alert, AlertOutcome::NotQualifying);
    assert!(p.transport.sent().is_empty());

    let page = p.store.recent(50);
    assert_eq!(page.total, 1);
    assert_eq!(page.signals[0].action, Some(Action::Hold));
    assert_eq!(page.signals[0].confidence, Some(0.5));
}

#[tokio::test]
async fn test_provider_failure_degrades_to_not_available() {
    let market = Arc::new(FakeMarket::new().failing("DOGEUSDT"));
    let model = Arc::new(ScriptedModel::replying("ACTION: HOLD\nCONFIDENCE: 0.5"));
    let p = pipeline(&["DOGEUSDT"], market, model.clone(), Duration::from_secs(1));

    let pass = p.monitor.run_pass().await;
    assert!(pass.failures.is_empty());

    let report = pass.report("DOGEUSDT").unwrap();
    assert!(report.features.orderbook.is_degraded());
    assert!(report.features.volume.is_degraded());
    assert!(report.features.momentum.is_degraded());
    assert_eq!(report.price.price, 0.0);
    assert_eq!(report.price.change_24h, 0.0);

    let prompt = model.prompts.lock().unwrap()[0].clone();
    assert!(prompt.contains("PRICE: $0.00 (24h: +0.00%)"));
    assert!(prompt.contains("Orderbook: N/A\nVolume: N/A\nMomentum: N/A"));

    let signal = &p.store.recent(1).signals[0];
    assert_eq!(signal.whale_signal, Some(WhaleIndicator::NotAvailable));
}

#[tokio::test]
async fn test_panicking_symbol_is_isolated() {
    let market = Arc::new(
        FakeMarket::new()
            .with_active_symbol("BTCUSDT", 66_000.0)
            .with_active_symbol("ETHUSDT", 3_200.0)
            .panicking("BADUSDT"),
    );
    let model = Arc::new(ScriptedModel::replying("ACTION: HOLD\nCONFIDENCE: 0.5"));
    let p = pipeline(
        &["BTCUSDT", "BADUSDT", "ETHUSDT"],
        market,
        model,
        Duration::from_secs(1),
    );

    let pass = p.monitor.run_pass().await;

    assert_eq!(pass.reports.len(), 2);
    assert_eq!(pass.failures.len(), 1);
    assert_eq!(pass.failures[0].0, "BADUSDT");

    let page = p.store.recent(0);
    assert_eq!(page.total, 2);
    assert_eq!(page.signals[0].symbol.as_deref(), Some("BTCUSDT"));
    assert_eq!(page.signals[1].symbol.as_deref(), Some("ETHUSDT"));
}

// ============================================================================
// Cooldown Tests
// ============================================================================

#[tokio::test]
async fn test_second_pass_within_cooldown_is_suppressed() {
    let market = Arc::new(FakeMarket::new().with_active_symbol("ETHUSDT", 3_200.0));
    let model = Arc::new(ScriptedModel::replying("ACTION: SELL\nCONFIDENCE: 0.9"));
    let p = pipeline(&["ETHUSDT"], market, model, Duration::from_secs(1));

    let first = p.monitor.run_pass().await;
    let second = p.monitor.run_pass().await;

    assert_eq!(first.report("ETHUSDT").unwrap().alert, AlertOutcome::Delivered);
    assert_eq!(second.report("ETHUSDT").unwrap().alert, AlertOutcome::Suppressed);
    assert_eq!(p.transport.sent().len(), 1);
    assert!(p.transport.sent()[0].starts_with("📉"));
    // Both decisions are still recorded
    assert_eq!(p.store.len(), 2);
}

#[tokio::test]
async fn test_failed_delivery_still_starts_cooldown() {
    let market = Arc::new(FakeMarket::new().with_active_symbol("BNBUSDT", 580.0));
    let model = Arc::new(ScriptedModel::replying(BUY_REPLY));
    let p = pipeline(&["BNBUSDT"], market, model, Duration::from_secs(1));
    p.transport.fail.store(true, Ordering::SeqCst);

    let first = p.monitor.run_pass().await;
    assert!(matches!(
        first.report("BNBUSDT").unwrap().alert,
        AlertOutcome::Failed(_)
    ));

    p.transport.fail.store(false, Ordering::SeqCst);
    let second = p.monitor.run_pass().await;
    assert_eq!(second.report("BNBUSDT").unwrap().alert, AlertOutcome::Suppressed);
    assert_eq!(p.transport.sent().len(), 1);
}

#[tokio::test]
async fn test_alert_after_window_measured_from_first_attempt() {
    let market = Arc::new(FakeMarket::new());
    let model = Arc::new(ScriptedModel::replying(""));
    let p = pipeline(&[], market, model, Duration::from_secs(1));
    let decision = Decision::new(Action::Buy, 0.9);
    let t0 = Utc.timestamp_opt(1_700_000_000, 0).unwrap();

    assert_eq!(
        p.alerts.dispatch_at("SOLUSDT", &decision, "first", t0).await,
        AlertOutcome::Delivered
    );
    assert_eq!(
        p.alerts
            .dispatch_at("SOLUSDT", &decision, "second", t0 + chrono::Duration::seconds(120))
            .await,
        AlertOutcome::Suppressed
    );
    assert_eq!(
        p.alerts
            .dispatch_at("SOLUSDT", &decision, "third", t0 + chrono::Duration::seconds(300))
            .await,
        AlertOutcome::Delivered
    );
    assert_eq!(p.transport.sent(), vec!["first", "third"]);
}

#[tokio::test]
async fn test_confident_hold_never_alerts() {
    let market = Arc::new(FakeMarket::new().with_active_symbol("BTCUSDT", 66_000.0));
    let model = Arc::new(ScriptedModel::replying("ACTION: HOLD\nCONFIDENCE: 0.99"));
    let p = pipeline(&["BTCUSDT"], market, model, Duration::from_secs(1));

    let pass = p.monitor.run_pass().await;
    assert_eq!(
        pass.report("BTCUSDT").unwrap().alert,
        AlertOutcome::NotQualifying
    );
    assert!(p.alerts.last_alert("BTCUSDT").is_none());
}
