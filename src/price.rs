use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::config::Config;
use crate::error::{MonitorError, Result};
use crate::types::PricePoint;

/// Source of the current BTC spot price and 24h change.
#[async_trait]
pub trait PriceDataSource: Send + Sync {
    async fn fetch_btc_price(&self) -> Result<PricePoint>;
}

/// CoinGecko simple-price adapter.
pub struct CoinGeckoPrice {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct SimplePriceResponse {
    bitcoin: Option<BitcoinQuote>,
}

#[derive(Debug, Deserialize)]
struct BitcoinQuote {
    usd: Option<f64>,
    #[serde(rename = "usd_24h_change")]
    usd_24h_change: Option<f64>,
}

impl CoinGeckoPrice {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .tcp_nodelay(true)
            .timeout(std::time::Duration::from_secs(config.http_timeout_secs))
            .build()
            .map_err(|e| MonitorError::Config(format!("http client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.price_url.clone(),
        })
    }

    /// A reachable feed that returns no usable numbers is `DataUnavailable`,
    /// distinct from a legitimate zero price-change reading.
    fn to_price_point(response: SimplePriceResponse) -> Result<PricePoint> {
        let quote = response
            .bitcoin
            .ok_or_else(|| MonitorError::DataUnavailable("no bitcoin entry".to_string()))?;

        let price = quote
            .usd
            .and_then(Decimal::from_f64)
            .ok_or_else(|| MonitorError::DataUnavailable("no usd price".to_string()))?;
        let change_24h_pct = quote
            .usd_24h_change
            .and_then(Decimal::from_f64)
            .ok_or_else(|| MonitorError::DataUnavailable("no 24h change".to_string()))?;

        Ok(PricePoint {
            price,
            change_24h_pct,
            fetched_at: Utc::now(),
        })
    }
}

#[async_trait]
impl PriceDataSource for CoinGeckoPrice {
    async fn fetch_btc_price(&self) -> Result<PricePoint> {
        let url = format!(
            "{}/simple/price?ids=bitcoin&vs_currencies=usd&include_24hr_change=true",
            self.base_url
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| MonitorError::Fetch(format!("price request: {}", e)))?
            .error_for_status()
            .map_err(|e| MonitorError::Fetch(format!("price status: {}", e)))?;

        let body: SimplePriceResponse = response
            .json()
            .await
            .map_err(|e| MonitorError::Fetch(format!("price response: {}", e)))?;

        Self::to_price_point(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn response_from_json(value: serde_json::Value) -> SimplePriceResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_full_quote_parses() {
        let response = response_from_json(serde_json::json!({
            "bitcoin": { "usd": 118250.0, "usd_24h_change": 3.21 }
        }));

        let point = CoinGeckoPrice::to_price_point(response).unwrap();
        assert_eq!(point.price, dec!(118250));
        assert!((point.change_24h_pct - dec!(3.21)).abs() < dec!(0.001));
    }

    #[test]
    fn test_missing_bitcoin_entry_is_unavailable() {
        let response = response_from_json(serde_json::json!({}));
        let err = CoinGeckoPrice::to_price_point(response).unwrap_err();
        assert!(matches!(err, MonitorError::DataUnavailable(_)));
    }

    #[test]
    fn test_missing_change_is_unavailable() {
        let response = response_from_json(serde_json::json!({
            "bitcoin": { "usd": 118250.0 }
        }));
        let err = CoinGeckoPrice::to_price_point(response).unwrap_err();
        assert!(matches!(err, MonitorError::DataUnavailable(_)));
    }

    #[test]
    fn test_zero_reading_is_not_unavailable() {
        let response = response_from_json(serde_json::json!({
            "bitcoin": { "usd": 0.0, "usd_24h_change": 0.0 }
        }));

        let point = CoinGeckoPrice::to_price_point(response).unwrap();
        assert_eq!(point.price, Decimal::ZERO);
        assert_eq!(point.change_24h_pct, Decimal::ZERO);
    }
}
