pub mod alerts;
pub mod decision;
pub mod features;
pub mod memecoin;
pub mod monitor;
pub mod signal_store;

pub use alerts::{format_alert_message, AlertDeduplicator, AlertOutcome};
pub use decision::{build_prompt, DecisionEngine, ParseError, ParseMode};
pub use features::FeatureExtractor;
pub use memecoin::MemecoinScorer;
pub use monitor::{MonitorLoop, PassReport, SymbolReport};
pub use signal_store::{MemecoinSignalStore, SignalStore, WhaleSignalStore};

/// Round to `dp` decimal places.
pub(crate) fn round_dp(value: f64, dp: i32) -> f64 {
    let factor = 10f64.powi(dp);
    (value * factor).round() / factor
}
