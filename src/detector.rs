use chrono::{DateTime, Duration, Utc};
use std::collections::HashSet;

use crate::types::BtcMarket;

/// Classifies markets that opened within the last few minutes.
///
/// Pure function of (market, now, already-notified set): no clock reads, no
/// side effects. Callers pass `Utc::now()` in production and fixed instants
/// in tests.
pub struct NewMarketDetector {
    window: Duration,
}

impl NewMarketDetector {
    pub fn new(window_mins: i64) -> Self {
        Self {
            window: Duration::minutes(window_mins),
        }
    }

    /// How long the market has been running, for display. Negative before
    /// the start time.
    pub fn minutes_running(market: &BtcMarket, now: DateTime<Utc>) -> f64 {
        (now - market.start_time).num_seconds() as f64 / 60.0
    }

    /// A market is new iff 0 <= elapsed <= window (inclusive at both ends),
    /// it has not passed its close time, and it has not already been
    /// alerted. Negative elapsed (clock skew, or a market that has not
    /// opened yet) is excluded rather than treated as an error.
    pub fn is_new(
        &self,
        market: &BtcMarket,
        now: DateTime<Utc>,
        notified: &HashSet<String>,
    ) -> bool {
        if notified.contains(&market.event_slug) {
            return false;
        }
        if now > market.end_time {
            return false;
        }

        let elapsed = now - market.start_time;
        elapsed >= Duration::zero() && elapsed <= self.window
    }
}
