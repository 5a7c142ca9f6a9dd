use chrono_tz::Tz;
use rust_decimal::Decimal;
use std::env;

use crate::error::{MonitorError, Result};

pub const GAMMA_API_URL: &str = "https://gamma-api.polymarket.com";
pub const PRICE_API_URL: &str = "https://api.coingecko.com/api/v3";

#[derive(Debug, Clone)]
pub struct Config {
    // Notifications
    pub webhook_url: String,

    // Polling
    pub poll_interval_secs: u64,
    pub new_market_window_mins: i64,

    // Prediction thresholds
    pub min_volume_usd: Decimal,
    pub momentum_threshold_pct: Decimal,

    // Display
    pub display_tz: Tz,

    // Transport
    pub http_timeout_secs: u64,

    // Mode
    pub log_level: String,

    // Endpoints
    pub gamma_url: String,
    pub price_url: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = Config {
            // Notifications
            webhook_url: env::var("WEBHOOK_URL")
                .map_err(|_| MonitorError::Config("WEBHOOK_URL not set".to_string()))?,

            // Polling
            poll_interval_secs: env::var("POLL_INTERVAL_SECS")
                .unwrap_or_else(|_| "120".to_string())
                .parse()
                .map_err(|_| MonitorError::Config("invalid POLL_INTERVAL_SECS".to_string()))?,
            new_market_window_mins: env::var("NEW_MARKET_WINDOW_MINS")
                .unwrap_or_else(|_| "3".to_string())
                .parse()
                .map_err(|_| MonitorError::Config("invalid NEW_MARKET_WINDOW_MINS".to_string()))?,

            // Prediction thresholds
            min_volume_usd: env::var("MIN_VOLUME_USD")
                .unwrap_or_else(|_| "500".to_string())
                .parse()
                .map_err(|_| MonitorError::Config("invalid MIN_VOLUME_USD".to_string()))?,
            momentum_threshold_pct: env::var("MOMENTUM_THRESHOLD_PCT")
                .unwrap_or_else(|_| "2".to_string())
                .parse()
                .map_err(|_| MonitorError::Config("invalid MOMENTUM_THRESHOLD_PCT".to_string()))?,

            // Display
            display_tz: env::var("DISPLAY_TIMEZONE")
                .unwrap_or_else(|_| "Asia/Jakarta".to_string())
                .parse::<Tz>()
                .map_err(|e| MonitorError::Config(format!("invalid DISPLAY_TIMEZONE: {}", e)))?,

            // Transport
            http_timeout_secs: env::var("HTTP_TIMEOUT_SECS")
                .unwrap_or_else(|_| "15".to_string())
                .parse()
                .map_err(|_| MonitorError::Config("invalid HTTP_TIMEOUT_SECS".to_string()))?,

            // Mode
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),

            // Endpoints
            gamma_url: env::var("GAMMA_API_URL").unwrap_or_else(|_| GAMMA_API_URL.to_string()),
            price_url: env::var("PRICE_API_URL").unwrap_or_else(|_| PRICE_API_URL.to_string()),
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject values the loop cannot run with. Called before the loop starts
    /// so bad settings fail the process instead of surfacing mid-cycle.
    pub fn validate(&self) -> Result<()> {
        if self.webhook_url.trim().is_empty() {
            return Err(MonitorError::Config("WEBHOOK_URL is empty".to_string()));
        }
        if self.poll_interval_secs == 0 {
            return Err(MonitorError::Config(
                "POLL_INTERVAL_SECS must be at least 1".to_string(),
            ));
        }
        if self.new_market_window_mins <= 0 {
            return Err(MonitorError::Config(
                "NEW_MARKET_WINDOW_MINS must be positive".to_string(),
            ));
        }
        if self.min_volume_usd < Decimal::ZERO {
            return Err(MonitorError::Config(
                "MIN_VOLUME_USD must not be negative".to_string(),
            ));
        }
        if self.momentum_threshold_pct <= Decimal::ZERO {
            return Err(MonitorError::Config(
                "MOMENTUM_THRESHOLD_PCT must be positive".to_string(),
            ));
        }
        if self.http_timeout_secs == 0 {
            return Err(MonitorError::Config(
                "HTTP_TIMEOUT_SECS must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
