use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;

/// Event from the Gamma API events endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GammaEvent {
    pub id: String,
    pub slug: String,
    pub title: Option<String>,
    pub end_date_iso: Option<String>,
    #[serde(default)]
    pub markets: Vec<GammaMarket>,
    /// Gamma serves volume as a JSON number on some events and a string on
    /// others; coerced with [`decimal_field`].
    pub volume: Option<serde_json::Value>,
}

/// Inner market of a Gamma event.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GammaMarket {
    pub question: Option<String>,
    pub outcomes: Option<String>,       // JSON string like "[\"Up\", \"Down\"]"
    pub outcome_prices: Option<String>, // JSON string like "[\"0.65\", \"0.35\"]"
}

/// Coerce a string-or-number JSON value into a Decimal.
pub fn decimal_field(value: &serde_json::Value) -> Option<Decimal> {
    match value {
        serde_json::Value::String(s) => s.trim().parse().ok(),
        serde_json::Value::Number(n) => n.to_string().parse().ok(),
        _ => None,
    }
}

/// Immutable snapshot of one BTC 15-min up/down market, re-fetched each poll.
#[derive(Debug, Clone)]
pub struct BtcMarket {
    pub event_slug: String,
    pub title: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Implied probability of the Up outcome, in [0, 1].
    pub up_odds: Decimal,
    /// Implied probability of the Down outcome, in [0, 1].
    pub down_odds: Decimal,
    /// Traded volume in USD.
    pub volume: Decimal,
}

/// BTC spot quote.
#[derive(Debug, Clone)]
pub struct PricePoint {
    pub price: Decimal,
    /// Signed 24h change in percent.
    pub change_24h_pct: Decimal,
    pub fetched_at: DateTime<Utc>,
}

/// Predicted direction for a market. Always one of the two — a fully tied
/// score resolves to Up (see the prediction engine).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Up => "UP",
            Direction::Down => "DOWN",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One contributing signal: human-facing label plus its signed score.
/// Positive pushes Up, negative pushes Down, zero is direction-neutral.
#[derive(Debug, Clone)]
pub struct Signal {
    pub label: String,
    pub weight: Decimal,
}

/// Output of the prediction engine.
#[derive(Debug, Clone)]
pub struct Prediction {
    pub direction: Direction,
    /// Clamped to [0, 100].
    pub confidence: Decimal,
    /// Ordered contributing signals, for the alert text only.
    pub factors: Vec<Signal>,
    /// Set iff traded volume is below the configured minimum.
    pub low_liquidity: bool,
}
