use crate::config::ExchangeCredentials;
use crate::sources::MarketDataProvider;
use crate::types::{Candle, CandleInterval, OrderBookLevel, OrderBookSnapshot};
use anyhow::anyhow;
use async_trait::async_trait;
use hmac::{Hmac, Mac};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use sha2::Sha256;
use std::time::Duration;
use tracing::{debug, warn};

type HmacSha256 = Hmac<Sha256>;

const BINANCE_API_URL: &str = "https://api.binance.com/api/v3";
const REQUEST_TIMEOUT_SECS: u64 = 5;
const RECV_WINDOW_MS: u64 = 5000;
const ERROR_EXCERPT_CHARS: usize = 200;

/// Binance depth response.
#[derive(Debug, Deserialize)]
struct BinanceDepth {
    bids: Vec<Vec<String>>,
    asks: Vec<Vec<String>>,
}

/// Binance ticker price response.
#[derive(Debug, Deserialize)]
struct BinanceTickerPrice {
    price: String,
}

/// Binance error body, e.g. `{"code":-1121,"msg":"Invalid symbol."}`.
#[derive(Debug, Deserialize)]
struct BinanceErrorBody {
    code: i64,
    msg: String,
}

/// Subset of the signed account response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BinanceAccount {
    can_trade: bool,
}

/// Binance spot REST client.
#[derive(Clone)]
pub struct BinanceClient {
    client: Client,
    base_url: String,
    credentials: Option<ExchangeCredentials>,
}

impl BinanceClient {
    /// Create a new Binance client. Without credentials only public
    /// endpoints are used.
    pub fn new(credentials: Option<ExchangeCredentials>) -> Self {
        let client = Client::builder()
            .user_agent("WhaleRadar/1.0")
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: BINANCE_API_URL.to_string(),
            credentials,
        }
    }

    /// Point the client at a different REST root (testnet, proxy).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn is_authenticated(&self) -> bool {
        self.credentials.is_some()
    }

    /// Check the configured key/secret against the signed account endpoint.
    /// Returns whether the account is allowed to trade.
    pub async fn verify_credentials(&self) -> anyhow::Result<bool> {
        let credentials = self
            .credentials
            .as_ref()
            .ok_or_else(|| anyhow!("no Binance credentials configured"))?;

        let query = format!(
            "recvWindow={}&timestamp={}",
            RECV_WINDOW_MS,
            chrono::Utc::now().timestamp_millis()
        );
        let signature = sign(&credentials.api_secret, &query)?;
        let url = format!("{}/account?{}&signature={}", self.base_url, query, signature);

        let response = self
            .client
            .get(&url)
            .header("X-MBX-APIKEY", &credentials.api_key)
            .send()
            .await?;

        let account: BinanceAccount = Self::decode(response).await?;
        Ok(account.can_trade)
    }

    async fn get_public<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> anyhow::Result<T> {
        let url = format!("{}/{}", self.base_url, path);

        let mut request = self.client.get(&url).query(query);
        if let Some(ref credentials) = self.credentials {
            request = request.header("X-MBX-APIKEY", &credentials.api_key);
        }

        let response = request.send().await?;
        Self::decode(response).await
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> anyhow::Result<T> {
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(error_from_body(status, &text));
        }

        Ok(response.json().await?)
    }
}

/// Build the error for a non-success response, logging a bounded excerpt
/// of the body.
fn error_from_body(status: StatusCode, text: &str) -> anyhow::Error {
    warn!("Binance API returned {}: {}", status, excerpt(text, ERROR_EXCERPT_CHARS));
    match serde_json::from_str::<BinanceErrorBody>(text) {
        Ok(body) => anyhow!(
            "Binance API error {} (code {}): {}",
            status.as_u16(),
            body.code,
            body.msg
        ),
        Err(_) => anyhow!("Binance API error {}", status.as_u16()),
    }
}

/// First `max` characters of `text`, never splitting a character.
fn excerpt(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

#[async_trait]
impl MarketDataProvider for BinanceClient {
    async fn candles(
        &self,
        symbol: &str,
        interval: CandleInterval,
        limit: usize,
    ) -> anyhow::Result<Vec<Candle>> {
        let rows: Vec<Vec<Value>> = self
            .get_public(
                "klines",
                &[
                    ("symbol", symbol.to_string()),
                    ("interval", interval.as_str().to_string()),
                    ("limit", limit.to_string()),
                ],
            )
            .await?;

        let total = rows.len();
        let candles: Vec<Candle> = rows.iter().filter_map(|row| parse_kline(row)).collect();
        if candles.len() < total {
            debug!(
                "Dropped {} malformed {} klines for {}",
                total - candles.len(),
                interval,
                symbol
            );
        }

        Ok(candles)
    }

    async fn order_book(&self, symbol: &str, depth: usize) -> anyhow::Result<OrderBookSnapshot> {
        let depth_response: BinanceDepth = self
            .get_public(
                "depth",
                &[("symbol", symbol.to_string()), ("limit", depth.to_string())],
            )
            .await?;

        Ok(OrderBookSnapshot {
            symbol: symbol.to_string(),
            bids: depth_response
                .bids
                .iter()
                .filter_map(|row| parse_level(row))
                .collect(),
            asks: depth_response
                .asks
                .iter()
                .filter_map(|row| parse_level(row))
                .collect(),
        })
    }

    async fn ticker_price(&self, symbol: &str) -> anyhow::Result<f64> {
        let ticker: BinanceTickerPrice = self
            .get_public("ticker/price", &[("symbol", symbol.to_string())])
            .await?;

        ticker
            .price
            .parse()
            .map_err(|_| anyhow!("invalid ticker price for {}: {}", symbol, ticker.price))
    }
}

/// HMAC-SHA256 signature of a query string, hex encoded.
fn sign(secret: &str, payload: &str) -> anyhow::Result<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| anyhow!("invalid signing key: {}", e))?;
    mac.update(payload.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Parse a `[price, quantity]` depth row.
fn parse_level(row: &[String]) -> Option<OrderBookLevel> {
    Some(OrderBookLevel {
        price: row.first()?.parse().ok()?,
        quantity: row.get(1)?.parse().ok()?,
    })
}

fn value_f64(value: &Value) -> Option<f64> {
    match value {
        Value::String(s) => s.parse().ok(),
        Value::Number(n) => n.as_f64(),
        _ => None,
    }
}

/// Parse a kline row:
/// `[openTime, open, high, low, close, volume, closeTime, quoteVolume, ...]`.
fn parse_kline(row: &[Value]) -> Option<Candle> {
    Some(Candle {
        open_time: row.first()?.as_i64()?,
        open: value_f64(row.get(1)?)?,
        high: value_f64(row.get(2)?)?,
        low: value_f64(row.get(3)?)?,
        close: value_f64(row.get(4)?)?,
        volume: value_f64(row.get(5)?)?,
        close_time: row.get(6)?.as_i64()?,
        quote_volume: value_f64(row.get(7)?)?,
    })
}
