use serde::{Deserialize, Serialize};

/// Confidence used when the advisory reply carries none, and for the fallback.
pub const DEFAULT_CONFIDENCE: f64 = 0.5;

/// Recommended trading action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Action {
    Buy,
    Sell,
    Hold,
}

impl Action {
    /// Parse an action token, ignoring case and surrounding whitespace.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "BUY" => Some(Action::Buy),
            "SELL" => Some(Action::Sell),
            "HOLD" => Some(Action::Hold),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Buy => "BUY",
            Action::Sell => "SELL",
            Action::Hold => "HOLD",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Action plus confidence in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub action: Action,
    pub confidence: f64,
}

impl Decision {
    /// Create a decision, clamping confidence into [0, 1].
    pub fn new(action: Action, confidence: f64) -> Self {
        Self {
            action,
            confidence: clamp_confidence(confidence),
        }
    }

    /// Decision used whenever the advisory service cannot be consulted.
    pub fn fallback() -> Self {
        Self::new(Action::Hold, DEFAULT_CONFIDENCE)
    }
}

/// Clamp a confidence into [0, 1]. NaN maps to the default confidence.
pub fn clamp_confidence(confidence: f64) -> f64 {
    if confidence.is_nan() {
        return DEFAULT_CONFIDENCE;
    }
    confidence.clamp(0.0, 1.0)
}
