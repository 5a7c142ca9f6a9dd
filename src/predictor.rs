//! Heuristic UP/DOWN scoring for freshly opened markets.
//!
//! Three signals, combined deterministically:
//! 1. Momentum: sign and size of the 24h BTC change
//! 2. Sentiment: how far the crowd odds sit from 50/50
//! 3. Volume: direction-neutral, caps confidence when liquidity is thin
//!
//! Direction is the sign of the momentum + sentiment sum. An exactly-zero
//! sum falls back to the single signal with the larger absolute score, and a
//! fully tied score resolves to UP. That rule is fixed so the same inputs
//! always produce the same call.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::types::{BtcMarket, Direction, PricePoint, Prediction, Signal};

/// Weights and thresholds for the scoring heuristic.
#[derive(Debug, Clone)]
pub struct ScoringConfig {
    /// |24h change| at or above this is strong momentum.
    pub momentum_strong_pct: Decimal,
    /// |24h change| at or above this (but below strong) is a weak lean.
    pub momentum_weak_pct: Decimal,
    pub momentum_strong_weight: Decimal,
    pub momentum_weak_weight: Decimal,
    /// Scale applied to the odds skew; a 10-point lean scores one unit.
    pub sentiment_weight: Decimal,
    /// |up - down| at or above this reads as a crowd lean in the factors.
    pub sentiment_lean_threshold: Decimal,
    /// Volume below this sets the risk flag.
    pub min_volume_usd: Decimal,
    /// Ceiling applied to confidence when the risk flag is set.
    pub low_volume_confidence_cap: Decimal,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            momentum_strong_pct: dec!(2),
            momentum_weak_pct: dec!(0.5),
            momentum_strong_weight: dec!(2),
            momentum_weak_weight: dec!(1),
            sentiment_weight: dec!(1),
            sentiment_lean_threshold: dec!(0.10),
            min_volume_usd: dec!(500),
            low_volume_confidence_cap: dec!(40),
        }
    }
}

pub struct PredictionEngine {
    config: ScoringConfig,
}

impl PredictionEngine {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    /// Score one market against the current BTC quote. Total function of its
    /// inputs: always returns a direction and a confidence in [0, 100].
    pub fn predict(&self, market: &BtcMarket, price: &PricePoint) -> Prediction {
        let momentum = self.momentum_signal(price.change_24h_pct);
        let sentiment = self.sentiment_signal(market.up_odds, market.down_odds);
        let (volume_note, low_liquidity) = self.volume_signal(market.volume);

        let combined = momentum.weight + sentiment.weight;

        let direction = if combined > Decimal::ZERO {
            Direction::Up
        } else if combined < Decimal::ZERO {
            Direction::Down
        } else if momentum.weight.abs() > sentiment.weight.abs() {
            Self::sign_of(momentum.weight)
        } else if sentiment.weight.abs() > momentum.weight.abs() {
            Self::sign_of(sentiment.weight)
        } else {
            // Fully tied. Fixed fallback so the call is deterministic.
            Direction::Up
        };

        // Agreement widens |combined| and raises confidence; two signals
        // pulling opposite ways pay an extra penalty on top of the smaller
        // |combined| they produce.
        let mut confidence = dec!(50) + combined.abs() * dec!(10);
        if momentum.weight * sentiment.weight < Decimal::ZERO {
            confidence -= momentum.weight.abs().min(sentiment.weight.abs()) * dec!(10);
        }
        if low_liquidity {
            confidence = confidence.min(self.config.low_volume_confidence_cap);
        }
        let confidence = confidence.clamp(Decimal::ZERO, dec!(100));

        Prediction {
            direction,
            confidence,
            factors: vec![momentum, sentiment, volume_note],
            low_liquidity,
        }
    }

    fn sign_of(weight: Decimal) -> Direction {
        if weight >= Decimal::ZERO {
            Direction::Up
        } else {
            Direction::Down
        }
    }

    fn momentum_signal(&self, change_pct: Decimal) -> Signal {
        let magnitude = change_pct.abs();
        let sign = if change_pct >= Decimal::ZERO {
            dec!(1)
        } else {
            dec!(-1)
        };

        if magnitude >= self.config.momentum_strong_pct {
            let mood = if sign > Decimal::ZERO { "bullish" } else { "bearish" };
            Signal {
                label: format!("strong {} momentum ({:+.2}% 24h)", mood, change_pct),
                weight: sign * self.config.momentum_strong_weight,
            }
        } else if magnitude >= self.config.momentum_weak_pct {
            let mood = if sign > Decimal::ZERO { "bullish" } else { "bearish" };
            Signal {
                label: format!("{} 24h drift ({:+.2}%)", mood, change_pct),
                weight: sign * self.config.momentum_weak_weight,
            }
        } else {
            Signal {
                label: format!("flat 24h price action ({:+.2}%)", change_pct),
                weight: Decimal::ZERO,
            }
        }
    }

    fn sentiment_signal(&self, up_odds: Decimal, down_odds: Decimal) -> Signal {
        let skew = up_odds - down_odds;
        // Proportional: a 10-point lean scores one sentiment_weight unit.
        let weight = skew * dec!(10) * self.config.sentiment_weight;

        let up_pct = (up_odds * dec!(100)).round_dp(0);
        let down_pct = (down_odds * dec!(100)).round_dp(0);

        let label = if skew.abs() >= self.config.sentiment_lean_threshold {
            let side = if skew > Decimal::ZERO { "UP" } else { "DOWN" };
            format!("crowd leans {} ({}% up / {}% down)", side, up_pct, down_pct)
        } else {
            format!("crowd near even ({}% up / {}% down)", up_pct, down_pct)
        };

        Signal { label, weight }
    }

    fn volume_signal(&self, volume: Decimal) -> (Signal, bool) {
        let low = volume < self.config.min_volume_usd;
        let label = if low {
            format!("low volume (${})", volume.round_dp(0))
        } else {
            format!("healthy volume (${})", volume.round_dp(0))
        };
        (
            Signal {
                label,
                weight: Decimal::ZERO,
            },
            low,
        )
    }
}
