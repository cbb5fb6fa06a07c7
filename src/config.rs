use std::env;
use std::time::Duration;

use crate::services::ParseMode;

/// Exchange credentials. Absent credentials run the monitor against public
/// endpoints only.
#[derive(Debug, Clone, Default)]
pub struct ExchangeCredentials {
    pub api_key: String,
    pub api_secret: String,
}

/// Chat alert destination.
#[derive(Debug, Clone)]
pub struct TelegramConfig {
    /// Bot token.
    pub token: String,
    /// Destination chat id.
    pub chat_id: String,
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host address.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Binance credentials (None = demo mode).
    pub exchange: Option<ExchangeCredentials>,
    /// Telegram alert transport (None = alerts disabled).
    pub telegram: Option<TelegramConfig>,
    /// Advisory inference service base URL.
    pub ollama_host: String,
    /// Advisory model name.
    pub ollama_model: String,
    /// How advisory replies are parsed.
    pub parse_mode: ParseMode,
    /// Symbols watched by the monitor loop, in evaluation order.
    pub symbols: Vec<String>,
    /// Pause between monitor passes.
    pub monitor_interval: Duration,
    /// Whether the monitor loop runs alongside the API.
    pub monitor_enabled: bool,
    /// Minimum time between two alerts for the same symbol.
    pub alert_cooldown: Duration,
    /// Minimum confidence for a non-HOLD decision to alert.
    pub alert_min_confidence: f64,
    /// Whale signal history capacity.
    pub whale_signal_capacity: usize,
    /// Memecoin signal history capacity.
    pub memecoin_signal_capacity: usize,
}

/// Treat empty values and template placeholders as absent.
fn credential(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty() && !v.contains("your_"))
}

fn parse_symbols(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .collect()
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn env_flag(name: &str, default: bool) -> bool {
    env::var(name)
        .ok()
        .map(|v| v == "true" || v == "1")
        .unwrap_or(default)
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let exchange = match (credential("BINANCE_API_KEY"), credential("BINANCE_API_SECRET")) {
            (Some(api_key), Some(api_secret)) => Some(ExchangeCredentials {
                api_key,
                api_secret,
            }),
            _ => None,
        };

        let telegram = match (credential("TELEGRAM_TOKEN"), credential("TELEGRAM_CHAT_ID")) {
            (Some(token), Some(chat_id)) => Some(TelegramConfig { token, chat_id }),
            _ => None,
        };

        let symbols = env::var("WATCH_SYMBOLS")
            .ok()
            .map(|s| parse_symbols(&s))
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| parse_symbols("BTCUSDT,ETHUSDT,BNBUSDT"));

        Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env_parse("PORT", 5001),
            exchange,
            telegram,
            ollama_host: env::var("OLLAMA_HOST")
                .unwrap_or_else(|_| "http://localhost:11434".to_string()),
            ollama_model: env::var("OLLAMA_MODEL").unwrap_or_else(|_| "qwen3:8b".to_string()),
            parse_mode: env::var("ADVISORY_PARSE_MODE")
                .ok()
                .and_then(|v| ParseMode::from_str(&v))
                .unwrap_or_default(),
            symbols,
            monitor_interval: Duration::from_secs(env_parse("MONITOR_INTERVAL_SECS", 60)),
            monitor_enabled: env_flag("MONITOR_ENABLED", true),
            alert_cooldown: Duration::from_secs(env_parse("ALERT_COOLDOWN_SECS", 300)),
            alert_min_confidence: env_parse("ALERT_MIN_CONFIDENCE", 0.70),
            whale_signal_capacity: env_parse("WHALE_SIGNAL_CAPACITY", 1000),
            memecoin_signal_capacity: env_parse("MEMECOIN_SIGNAL_CAPACITY", 500),
        }
    }

    /// True when no exchange credentials are configured.
    pub fn demo_mode(&self) -> bool {
        self.exchange.is_none()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5001,
            exchange: None,
            telegram: None,
            ollama_host: "http://localhost:11434".to_string(),
            ollama_model: "qwen3:8b".to_string(),
            parse_mode: ParseMode::default(),
            symbols: parse_symbols("BTCUSDT,ETHUSDT,BNBUSDT"),
            monitor_interval: Duration::from_secs(60),
            monitor_enabled: true,
            alert_cooldown: Duration::from_secs(300),
            alert_min_confidence: 0.70,
            whale_signal_capacity: 1000,
            memecoin_signal_capacity: 500,
        }
    }
}
