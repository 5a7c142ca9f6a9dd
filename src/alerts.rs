use async_trait::async_trait;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use reqwest::Client;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::json;

use crate::config::Config;
use crate::detector::NewMarketDetector;
use crate::error::{MonitorError, Result};
use crate::types::{BtcMarket, PricePoint, Prediction};

/// Public market page derived from the event slug.
pub fn market_url(event_slug: &str) -> String {
    format!("https://polymarket.com/event/{}", event_slug)
}

fn confidence_tier(confidence: Decimal) -> &'static str {
    if confidence >= dec!(75) {
        "HIGH"
    } else if confidence >= dec!(50) {
        "MEDIUM"
    } else {
        "LOW"
    }
}

/// Render the alert text. Pure: the same inputs always produce the same
/// message, and every well-formed prediction renders without failing.
pub fn format_alert(
    market: &BtcMarket,
    prediction: &Prediction,
    price: &PricePoint,
    now: DateTime<Utc>,
    tz: Tz,
) -> String {
    let started = market.start_time.with_timezone(&tz);
    let closes = market.end_time.with_timezone(&tz);

    let running_mins = NewMarketDetector::minutes_running(market, now);
    let to_close_mins = ((market.end_time - now).num_seconds() as f64 / 60.0).max(0.0);

    let trend_marker = if price.change_24h_pct >= Decimal::ZERO {
        "📈"
    } else {
        "📉"
    };

    let mut message = format!(
        "🔔 **NEW MARKET JUST OPENED**\n\n⏰ Started: {}\n🔗 {}\n",
        started.format("%H:%M:%S %Z"),
        market_url(&market.event_slug),
    );

    message.push_str(&format!(
        "\n📊 Prediction: **{}** (confidence {}/100, {})\n💡 Signals:\n",
        prediction.direction,
        prediction.confidence.round_dp(0),
        confidence_tier(prediction.confidence),
    ));
    for factor in &prediction.factors {
        message.push_str(&format!("  • {}\n", factor.label));
    }

    message.push_str(&format!(
        "\n💰 Market conditions:\n  • BTC: ${} ({:+.2}% 24h) {}\n  • Odds: {}% UP / {}% DOWN\n  • Volume: ${}\n",
        price.price.round_dp(0),
        price.change_24h_pct,
        trend_marker,
        (market.up_odds * dec!(100)).round_dp(0),
        (market.down_odds * dec!(100)).round_dp(0),
        market.volume.round_dp(0),
    ));

    message.push_str(&format!(
        "\n⏱️ Timing:\n  • Started: {} / Closes: {}\n  • Running: {:.1} min, {:.1} min to close\n",
        started.format("%H:%M"),
        closes.format("%H:%M"),
        running_mins,
        to_close_mins,
    ));

    if prediction.low_liquidity {
        message.push_str("\n⚠️ **WARNING: volume below minimum, thin market, high risk!**\n");
    }

    message
}

/// Delivers one pre-formatted payload per call.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn send(&self, message: &str) -> Result<()>;
}

/// Webhook sink. Unlike a fire-and-forget alerter, failures surface to the
/// caller: the loop only marks a market notified after a successful send.
pub struct WebhookSink {
    client: Client,
    url: String,
}

impl WebhookSink {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .tcp_nodelay(true)
            .timeout(std::time::Duration::from_secs(config.http_timeout_secs))
            .build()
            .map_err(|e| MonitorError::Config(format!("http client: {}", e)))?;

        Ok(Self {
            client,
            url: config.webhook_url.clone(),
        })
    }
}

#[async_trait]
impl NotificationSink for WebhookSink {
    async fn send(&self, message: &str) -> Result<()> {
        let payload = json!({ "message": message });

        let response = self
            .client
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| MonitorError::Delivery(format!("webhook request: {}", e)))?;

        if !response.status().is_success() {
            return Err(MonitorError::Delivery(format!(
                "webhook status {}",
                response.status()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Direction, Signal};
    use chrono::Duration;

    fn fixtures() -> (BtcMarket, Prediction, PricePoint, DateTime<Utc>) {
        let now = Utc::now();
        let start = now - Duration::minutes(1);
        let market = BtcMarket {
            event_slug: "btc-updown-15m-1754550000".to_string(),
            title: "Bitcoin Up or Down?".to_string(),
            start_time: start,
            end_time: start + Duration::minutes(15),
            up_odds: dec!(0.65),
            down_odds: dec!(0.35),
            volume: dec!(1200),
        };
        let prediction = Prediction {
            direction: Direction::Up,
            confidence: dec!(82),
            factors: vec![Signal {
                label: "strong bullish momentum (+3.20% 24h)".to_string(),
                weight: dec!(2),
            }],
            low_liquidity: false,
        };
        let price = PricePoint {
            price: dec!(118250),
            change_24h_pct: dec!(3.2),
            fetched_at: now,
        };
        (market, prediction, price, now)
    }

    #[test]
    fn test_format_is_idempotent() {
        let (market, prediction, price, now) = fixtures();
        let tz = chrono_tz::Asia::Jakarta;
        let first = format_alert(&market, &prediction, &price, now, tz);
        let second = format_alert(&market, &prediction, &price, now, tz);
        assert_eq!(first, second);
    }

    #[test]
    fn test_message_contents() {
        let (market, prediction, price, now) = fixtures();
        let message = format_alert(&market, &prediction, &price, now, chrono_tz::Asia::Jakarta);

        assert!(message.contains("https://polymarket.com/event/btc-updown-15m-1754550000"));
        assert!(message.contains("**UP**"));
        assert!(message.contains("82/100"));
        assert!(message.contains("HIGH"));
        assert!(message.contains("65% UP / 35% DOWN"));
        assert!(message.contains("strong bullish momentum"));
        assert!(!message.contains("WARNING"));
    }

    #[test]
    fn test_risk_warning_present_iff_flagged() {
        let (market, mut prediction, price, now) = fixtures();
        prediction.low_liquidity = true;
        let message = format_alert(&market, &prediction, &price, now, chrono_tz::Asia::Jakarta);
        assert!(message.contains("WARNING"));
    }

    #[test]
    fn test_time_to_close_floored_at_zero() {
        let (mut market, prediction, price, now) = fixtures();
        market.end_time = now - Duration::minutes(1);
        let message = format_alert(&market, &prediction, &price, now, chrono_tz::Asia::Jakarta);
        assert!(message.contains("0.0 min to close"));
    }

    #[test]
    fn test_confidence_tiers() {
        assert_eq!(confidence_tier(dec!(90)), "HIGH");
        assert_eq!(confidence_tier(dec!(75)), "HIGH");
        assert_eq!(confidence_tier(dec!(60)), "MEDIUM");
        assert_eq!(confidence_tier(dec!(40)), "LOW");
    }
}
