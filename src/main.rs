use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use whale_radar::config::Config;
use whale_radar::services::{
    AlertDeduplicator, DecisionEngine, FeatureExtractor, MemecoinScorer, MemecoinSignalStore,
    MonitorLoop, WhaleSignalStore,
};
use whale_radar::sources::{
    AlertTransport, BinanceClient, DexScreenerClient, DisabledTransport, MarketDataProvider,
    OllamaClient, TelegramNotifier,
};
use whale_radar::{app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "whale_radar=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Arc::new(Config::from_env());
    info!("Starting Whale Radar on {}:{}", config.host, config.port);

    // Market data
    let binance = BinanceClient::new(config.exchange.clone());
    if config.demo_mode() {
        info!("No Binance credentials configured, using public endpoints only");
    } else if binance.is_authenticated() {
        match binance.verify_credentials().await {
            Ok(can_trade) => info!("Binance credentials verified (can_trade={})", can_trade),
            Err(e) => warn!("Binance credential check failed: {}", e),
        }
    }
    let market_data: Arc<dyn MarketDataProvider> = Arc::new(binance);

    // Signal history
    let whale_signals = Arc::new(WhaleSignalStore::new(config.whale_signal_capacity));
    let memecoin_signals = Arc::new(MemecoinSignalStore::new(config.memecoin_signal_capacity));

    let memecoin_scorer = Arc::new(MemecoinScorer::new(
        market_data.clone(),
        Arc::new(DexScreenerClient::new()),
    ));

    // Start the monitor loop
    if config.monitor_enabled {
        let transport: Arc<dyn AlertTransport> = match config.telegram.clone() {
            Some(telegram) => {
                info!("Telegram alerts enabled");
                Arc::new(TelegramNotifier::new(telegram))
            }
            None => {
                info!("No Telegram destination configured, alerts disabled");
                Arc::new(DisabledTransport)
            }
        };

        let model = Arc::new(OllamaClient::new(
            config.ollama_host.clone(),
            config.ollama_model.clone(),
        ));

        let monitor = MonitorLoop::new(
            config.symbols.clone(),
            FeatureExtractor::new(market_data.clone()),
            DecisionEngine::new(model, config.parse_mode),
            Arc::new(AlertDeduplicator::new(
                transport,
                config.alert_cooldown,
                config.alert_min_confidence,
            )),
            whale_signals.clone(),
            config.monitor_interval,
        );

        tokio::spawn(monitor.run());
    } else {
        info!("Monitor loop disabled");
    }

    // Create application state
    let state = AppState {
        whale_signals,
        memecoin_signals,
        market_data,
        memecoin_scorer,
    };

    // Start the server
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Whale Radar listening on {}", addr);

    axum::serve(listener, app(state)).await?;

    Ok(())
}
