//! The poll loop: fixed-interval market checks with duplicate suppression.
//!
//! Cycles run strictly sequentially. A tick fires only when the previous
//! cycle has completed, so there is never an overlapping check and the
//! notified set needs no locking. Shutdown is honored between cycles, never
//! mid-cycle.

use chrono::{DateTime, Utc};
use std::collections::HashSet;
use tokio::sync::watch;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{info, warn};

use crate::alerts::{format_alert, NotificationSink};
use crate::config::Config;
use crate::detector::NewMarketDetector;
use crate::error::{MonitorError, Result};
use crate::market::MarketDataSource;
use crate::predictor::{PredictionEngine, ScoringConfig};
use crate::price::PriceDataSource;
use crate::retry::retry_async;
use crate::types::BtcMarket;

const FETCH_ATTEMPTS: u32 = 2;

/// Outcome of one completed poll cycle, for the cycle summary log.
#[derive(Debug, Default)]
pub struct CycleReport {
    pub markets_seen: usize,
    pub new_markets: usize,
    pub alerts_sent: usize,
    pub skipped: usize,
}

pub struct Monitor<M, P, N> {
    config: Config,
    markets: M,
    prices: P,
    sink: N,
    detector: NewMarketDetector,
    engine: PredictionEngine,
    /// Event slugs already alerted this process run. Grows only; in-memory
    /// only, so a restart may re-alert a market still inside the window.
    notified: HashSet<String>,
}

impl<M, P, N> Monitor<M, P, N>
where
    M: MarketDataSource,
    P: PriceDataSource,
    N: NotificationSink,
{
    pub fn new(config: Config, markets: M, prices: P, sink: N) -> Self {
        let detector = NewMarketDetector::new(config.new_market_window_mins);
        let engine = PredictionEngine::new(ScoringConfig {
            momentum_strong_pct: config.momentum_threshold_pct,
            min_volume_usd: config.min_volume_usd,
            ..Default::default()
        });

        Self {
            config,
            markets,
            prices,
            sink,
            detector,
            engine,
            notified: HashSet::new(),
        }
    }

    /// Run until the shutdown signal flips. Cycle failures are logged and
    /// the loop waits for the next tick; nothing escapes.
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = interval(Duration::from_secs(self.config.poll_interval_secs));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut check_count: u64 = 0;

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("Shutdown requested, stopping at tick boundary");
                        break;
                    }
                }
                _ = ticker.tick() => {
                    check_count += 1;
                    info!("Check #{}", check_count);

                    match self.run_cycle(Utc::now()).await {
                        Ok(report) if report.new_markets == 0 => {
                            info!(
                                "No new markets among {} active (window 0-{} min)",
                                report.markets_seen, self.config.new_market_window_mins
                            );
                        }
                        Ok(report) => {
                            info!(
                                "Cycle done: {} new, {} alerted, {} skipped",
                                report.new_markets, report.alerts_sent, report.skipped
                            );
                        }
                        Err(e) => warn!("Cycle aborted: {}", e),
                    }
                }
            }
        }

        info!("Monitor stopped");
    }

    /// One poll cycle. A market-list failure aborts the whole cycle; a
    /// per-market failure (price feed, delivery) skips just that market and
    /// leaves it unmarked, so it stays eligible while inside the window.
    pub async fn run_cycle(&mut self, now: DateTime<Utc>) -> Result<CycleReport> {
        let markets = retry_async("market fetch", FETCH_ATTEMPTS, || {
            self.markets.fetch_active_markets()
        })
        .await?;

        let mut report = CycleReport {
            markets_seen: markets.len(),
            ..Default::default()
        };

        let fresh: Vec<&BtcMarket> = markets
            .iter()
            .filter(|m| self.detector.is_new(m, now, &self.notified))
            .collect();
        report.new_markets = fresh.len();

        for market in fresh {
            match self.alert_market(market, now).await {
                Ok(()) => {
                    // Marked only after a successful send: a failed delivery
                    // retries next cycle while the market is still new.
                    self.notified.insert(market.event_slug.clone());
                    report.alerts_sent += 1;
                }
                Err(MonitorError::DataUnavailable(e)) => {
                    warn!("Skipping {}: price data unavailable ({})", market.event_slug, e);
                    report.skipped += 1;
                }
                Err(e) => {
                    warn!("Skipping {}: {}", market.event_slug, e);
                    report.skipped += 1;
                }
            }
        }

        Ok(report)
    }

    async fn alert_market(&self, market: &BtcMarket, now: DateTime<Utc>) -> Result<()> {
        info!(
            "🎯 New market: {} (running {:.1} min)",
            market.event_slug,
            NewMarketDetector::minutes_running(market, now)
        );

        let price = retry_async("price fetch", FETCH_ATTEMPTS, || {
            self.prices.fetch_btc_price()
        })
        .await?;

        let prediction = self.engine.predict(market, &price);
        let message = format_alert(market, &prediction, &price, now, self.config.display_tz);

        retry_async("notification send", FETCH_ATTEMPTS, || {
            self.sink.send(&message)
        })
        .await?;

        info!(
            "✅ Alert sent for {}: {} ({}/100)",
            market.event_slug,
            prediction.direction,
            prediction.confidence.round_dp(0)
        );
        Ok(())
    }
}
