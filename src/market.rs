use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::debug;

use crate::config::Config;
use crate::error::{MonitorError, Result};
use crate::types::{decimal_field, BtcMarket, GammaEvent, GammaMarket};

/// Every market under the btc-15m tag runs for exactly 15 minutes; the API
/// exposes only the close time, so the start is derived.
const MARKET_DURATION_MINS: i64 = 15;

/// Source of the current set of active BTC 15-minute markets.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    async fn fetch_active_markets(&self) -> Result<Vec<BtcMarket>>;
}

/// Gamma API adapter.
pub struct GammaMarkets {
    client: Client,
    base_url: String,
}

impl GammaMarkets {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .tcp_nodelay(true)
            .timeout(std::time::Duration::from_secs(config.http_timeout_secs))
            .build()
            .map_err(|e| MonitorError::Config(format!("http client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.gamma_url.clone(),
        })
    }

    /// Turn a Gamma event into a market snapshot. Events without a usable
    /// close time are skipped; missing odds fall back to an even 50/50 so a
    /// sparse event still renders instead of erroring.
    fn parse_event(event: &GammaEvent) -> Option<BtcMarket> {
        let end_time = match event
            .end_date_iso
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        {
            Some(t) => t.with_timezone(&Utc),
            None => {
                debug!("Skipping event {}: no usable close time", event.slug);
                return None;
            }
        };
        let start_time = end_time - Duration::minutes(MARKET_DURATION_MINS);

        let (up_odds, down_odds) = event
            .markets
            .first()
            .and_then(Self::parse_odds)
            .unwrap_or((dec!(0.5), dec!(0.5)));

        let volume = event
            .volume
            .as_ref()
            .and_then(decimal_field)
            .unwrap_or(Decimal::ZERO);

        let title = event
            .title
            .clone()
            .or_else(|| event.markets.first().and_then(|m| m.question.clone()))
            .unwrap_or_else(|| event.slug.clone());

        Some(BtcMarket {
            event_slug: event.slug.clone(),
            title,
            start_time,
            end_time,
            up_odds,
            down_odds,
            volume,
        })
    }

    /// Odds come as parallel JSON strings: outcomes and outcomePrices.
    fn parse_odds(market: &GammaMarket) -> Option<(Decimal, Decimal)> {
        let outcomes: Vec<String> = serde_json::from_str(market.outcomes.as_deref()?).ok()?;
        let prices: Vec<String> = serde_json::from_str(market.outcome_prices.as_deref()?).ok()?;

        let mut up = None;
        let mut down = None;
        for (i, outcome) in outcomes.iter().enumerate() {
            if let Some(price) = prices.get(i).and_then(|p| p.parse::<Decimal>().ok()) {
                match outcome.to_lowercase().as_str() {
                    "up" | "yes" => up = Some(price.clamp(Decimal::ZERO, Decimal::ONE)),
                    "down" | "no" => down = Some(price.clamp(Decimal::ZERO, Decimal::ONE)),
                    _ => {}
                }
            }
        }

        match (up, down) {
            (Some(u), Some(d)) => Some((u, d)),
            _ => None,
        }
    }
}

#[async_trait]
impl MarketDataSource for GammaMarkets {
    async fn fetch_active_markets(&self) -> Result<Vec<BtcMarket>> {
        let url = format!(
            "{}/events?tag=btc-15m&closed=false&active=true&archived=false&limit=50",
            self.base_url
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| MonitorError::Fetch(format!("gamma request: {}", e)))?
            .error_for_status()
            .map_err(|e| MonitorError::Fetch(format!("gamma status: {}", e)))?;

        let events: Vec<GammaEvent> = response
            .json()
            .await
            .map_err(|e| MonitorError::Fetch(format!("gamma response: {}", e)))?;

        let markets: Vec<BtcMarket> = events.iter().filter_map(Self::parse_event).collect();
        debug!("Gamma returned {} events, {} parsed", events.len(), markets.len());
        Ok(markets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event_from_json(value: serde_json::Value) -> GammaEvent {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_parse_event_full() {
        let event = event_from_json(serde_json::json!({
            "id": "901",
            "slug": "btc-updown-15m-1754550000",
            "title": "Bitcoin Up or Down?",
            "endDateIso": "2026-08-07T09:15:00Z",
            "volume": "1234.5",
            "markets": [{
                "question": "Bitcoin Up or Down?",
                "outcomes": "[\"Up\", \"Down\"]",
                "outcomePrices": "[\"0.65\", \"0.35\"]"
            }]
        }));

        let market = GammaMarkets::parse_event(&event).unwrap();
        assert_eq!(market.up_odds, dec!(0.65));
        assert_eq!(market.down_odds, dec!(0.35));
        assert_eq!(market.volume, dec!(1234.5));
        assert_eq!(market.end_time - market.start_time, Duration::minutes(15));
    }

    #[test]
    fn test_event_without_close_time_skipped() {
        let event = event_from_json(serde_json::json!({
            "id": "902",
            "slug": "btc-updown-15m-1754550900",
            "markets": []
        }));
        assert!(GammaMarkets::parse_event(&event).is_none());
    }

    #[test]
    fn test_missing_odds_fall_back_to_even() {
        let event = event_from_json(serde_json::json!({
            "id": "903",
            "slug": "btc-updown-15m-1754551800",
            "endDateIso": "2026-08-07T09:30:00Z",
            "markets": [{ "question": "Bitcoin Up or Down?" }]
        }));

        let market = GammaMarkets::parse_event(&event).unwrap();
        assert_eq!(market.up_odds, dec!(0.5));
        assert_eq!(market.down_odds, dec!(0.5));
        assert_eq!(market.volume, Decimal::ZERO);
    }

    #[test]
    fn test_numeric_volume_coerced() {
        let event = event_from_json(serde_json::json!({
            "id": "904",
            "slug": "btc-updown-15m-1754552700",
            "endDateIso": "2026-08-07T09:45:00Z",
            "volume": 987,
            "markets": []
        }));

        let market = GammaMarkets::parse_event(&event).unwrap();
        assert_eq!(market.volume, dec!(987));
    }

    #[test]
    fn test_yes_no_outcomes_accepted() {
        let market = GammaMarket {
            question: None,
            outcomes: Some("[\"Yes\", \"No\"]".to_string()),
            outcome_prices: Some("[\"0.58\", \"0.42\"]".to_string()),
        };
        let (up, down) = GammaMarkets::parse_odds(&market).unwrap();
        assert_eq!(up, dec!(0.58));
        assert_eq!(down, dec!(0.42));
    }
}
