//! Advisory decision engine.
//!
//! Builds a compact prompt from the price snapshot and micro-signals, asks the
//! advisory model for a recommendation and parses the free-text reply into a
//! [`Decision`]. Any failure to consult the model yields the HOLD fallback.

use crate::sources::AdvisoryModel;
use crate::types::{Action, Decision, MarketFeatures, PriceSnapshot, DEFAULT_CONFIDENCE};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Upper bound on a single advisory call.
pub const INFERENCE_TIMEOUT: Duration = Duration::from_secs(30);

/// How advisory replies are interpreted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ParseMode {
    /// Keyword scan: BUY anywhere wins over SELL, the last readable
    /// confidence wins.
    #[default]
    Lenient,
    /// Exactly one `ACTION:` and one `CONFIDENCE:` line, otherwise fallback.
    Strict,
}

impl ParseMode {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "lenient" => Some(ParseMode::Lenient),
            "strict" => Some(ParseMode::Strict),
            _ => None,
        }
    }
}

/// Why a strict parse rejected a reply.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("expected exactly one {field} line, found {found}")]
    FieldCount { field: &'static str, found: usize },

    #[error("unrecognized action: {0}")]
    InvalidAction(String),

    #[error("unreadable confidence: {0}")]
    InvalidConfidence(String),
}

/// Format a dollar amount with thousands separators and two decimals.
pub fn format_usd(value: f64) -> String {
    let formatted = format!("{:.2}", value.abs());
    let (whole, frac) = formatted.split_once('.').unwrap_or((formatted.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 { "-" } else { "" };
    format!("{}{}.{}", sign, grouped, frac)
}

/// Prompt sent to the advisory model for one symbol.
pub fn build_prompt(symbol: &str, price: &PriceSnapshot, features: &MarketFeatures) -> String {
    format!(
        "Analyze {symbol}:\n\
         PRICE: ${price} (24h: {change:+.2}%)\n\
         Orderbook: {orderbook}\n\
         Volume: {volume}\n\
         Momentum: {momentum}\n\
         \n\
         Recommend BUY/SELL/HOLD. Format:\n\
         ACTION: BUY\n\
         CONFIDENCE: 0.75",
        symbol = symbol,
        price = format_usd(price.price),
        change = price.change_24h,
        orderbook = features.whale_signal().as_str(),
        volume = features.volume_signal().as_str(),
        momentum = features.momentum_signal().as_str(),
    )
}

/// Keyword-scan parse. Never fails.
///
/// BUY appearing anywhere takes priority over SELL; otherwise HOLD. Every
/// line mentioning `CONFIDENCE:` is read; the token after its last colon
/// replaces the running confidence when it parses to a finite number.
pub fn parse_lenient(reply: &str) -> Decision {
    let upper = reply.to_uppercase();

    let action = if upper.contains("BUY") {
        Action::Buy
    } else if upper.contains("SELL") {
        Action::Sell
    } else {
        Action::Hold
    };

    let mut confidence = DEFAULT_CONFIDENCE;
    for line in upper.lines().filter(|l| l.contains("CONFIDENCE:")) {
        let token = line.rsplit(':').next().unwrap_or_default().trim();
        if let Ok(value) = token.parse::<f64>() {
            if value.is_finite() {
                confidence = value;
            }
        }
    }

    Decision::new(action, confidence)
}

fn field_value<'a>(reply: &'a str, field: &'static str) -> Result<&'a str, ParseError> {
    let prefix_len = field.len() + 1;
    let values: Vec<&str> = reply
        .lines()
        .map(str::trim)
        .filter(|l| {
            l.get(..prefix_len).map_or(false, |head| {
                head.ends_with(':') && head[..field.len()].eq_ignore_ascii_case(field)
            })
        })
        .map(|l| l[prefix_len..].trim())
        .collect();

    match values.as_slice() {
        [value] => Ok(*value),
        _ => Err(ParseError::FieldCount {
            field,
            found: values.len(),
        }),
    }
}

/// Structured parse: one `ACTION:` line and one `CONFIDENCE:` line.
pub fn parse_strict(reply: &str) -> Result<Decision, ParseError> {
    let action_raw = field_value(reply, "ACTION")?;
    let action = Action::from_str(action_raw)
        .ok_or_else(|| ParseError::InvalidAction(action_raw.to_string()))?;

    let confidence_raw = field_value(reply, "CONFIDENCE")?;
    let confidence = confidence_raw
        .parse::<f64>()
        .ok()
        .filter(|c| c.is_finite())
        .ok_or_else(|| ParseError::InvalidConfidence(confidence_raw.to_string()))?;

    Ok(Decision::new(action, confidence))
}

/// Consults the advisory model and turns its reply into a decision.
#[derive(Clone)]
pub struct DecisionEngine {
    model: Arc<dyn AdvisoryModel>,
    parse_mode: ParseMode,
    timeout: Duration,
}

impl DecisionEngine {
    pub fn new(model: Arc<dyn AdvisoryModel>, parse_mode: ParseMode) -> Self {
        Self {
            model,
            parse_mode,
            timeout: INFERENCE_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn model_name(&self) -> &str {
        self.model.model_name()
    }

    pub fn parse_mode(&self) -> ParseMode {
        self.parse_mode
    }

    /// Parse a reply with the configured mode. Strict rejects fall back.
    pub fn parse(&self, reply: &str) -> Decision {
        match self.parse_mode {
            ParseMode::Lenient => parse_lenient(reply),
            ParseMode::Strict => parse_strict(reply).unwrap_or_else(|e| {
                debug!("Rejected advisory reply: {}", e);
                Decision::fallback()
            }),
        }
    }

    /// Ask the model for a decision on `symbol`.
    ///
    /// Errors and timeouts yield `{HOLD, 0.5}`.
    pub async fn decide(
        &self,
        symbol: &str,
        price: &PriceSnapshot,
        features: &MarketFeatures,
    ) -> Decision {
        let prompt = build_prompt(symbol, price, features);

        match tokio::time::timeout(self.timeout, self.model.generate(&prompt)).await {
            Ok(Ok(reply)) => {
                let decision = self.parse(&reply);
                debug!(
                    "{} advisory: {} ({:.2})",
                    symbol, decision.action, decision.confidence
                );
                decision
            }
            Ok(Err(e)) => {
                warn!("Advisory call failed for {}: {}", symbol, e);
                Decision::fallback()
            }
            Err(_) => {
                warn!(
                    "Advisory call for {} timed out after {:?}",
                    symbol, self.timeout
                );
                Decision::fallback()
            }
        }
    }
}
