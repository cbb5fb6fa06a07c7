//! DexScreener search client used for liquidity lookups.

use crate::sources::LiquidityLookup;
use anyhow::anyhow;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

const DEXSCREENER_API_URL: &str = "https://api.dexscreener.com/latest/dex";
const LOOKUP_TIMEOUT_SECS: u64 = 5;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    pairs: Option<Vec<SearchPair>>,
}

#[derive(Debug, Deserialize)]
struct SearchPair {
    liquidity: Option<PairLiquidity>,
}

#[derive(Debug, Deserialize)]
struct PairLiquidity {
    usd: Option<f64>,
}

impl SearchResponse {
    /// USD liquidity of the first matching pair; a pair without a
    /// liquidity figure counts as zero.
    fn first_pair_liquidity(&self) -> Option<f64> {
        let pair = self.pairs.as_ref()?.first()?;
        Some(
            pair.liquidity
                .as_ref()
                .and_then(|l| l.usd)
                .unwrap_or(0.0),
        )
    }
}

pub struct DexScreenerClient {
    client: Client,
    base_url: String,
}

impl DexScreenerClient {
    pub fn new() -> Self {
        let client = Client::builder()
            .user_agent("WhaleRadar/1.0")
            .timeout(Duration::from_secs(LOOKUP_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: DEXSCREENER_API_URL.to_string(),
        }
    }
}

impl Default for DexScreenerClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LiquidityLookup for DexScreenerClient {
    async fn liquidity_usd(&self, symbol: &str) -> anyhow::Result<Option<f64>> {
        let response = self
            .client
            .get(format!("{}/search", self.base_url))
            .query(&[("q", symbol)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(anyhow!("DexScreener returned {}", response.status()));
        }

        let search: SearchResponse = response.json().await?;
        Ok(search.first_pair_liquidity())
    }
}
