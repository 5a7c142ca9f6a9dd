use anyhow::Result;
use tokio::sync::watch;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use btc_alert_bot::alerts::WebhookSink;
use btc_alert_bot::config::Config;
use btc_alert_bot::market::GammaMarkets;
use btc_alert_bot::monitor::Monitor;
use btc_alert_bot::price::CoinGeckoPrice;

#[tokio::main]
async fn main() -> Result<()> {
    // Bad settings fail here, before the loop ever starts.
    let config = Config::from_env()?;

    let _subscriber = FmtSubscriber::builder()
        .with_max_level(match config.log_level.as_str() {
            "debug" => Level::DEBUG,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        })
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .init();

    info!("╔═══════════════════════════════════════╗");
    info!("║     BTC 15-Min Market Monitor         ║");
    info!("╠═══════════════════════════════════════╣");
    info!("║ Poll interval: {:>18}s  ║", config.poll_interval_secs);
    info!("║ New-market window: 0-{:>11} min ║", config.new_market_window_mins);
    info!("║ Min volume: ${:>21}  ║", config.min_volume_usd);
    info!("║ Display timezone: {:>18} ║", config.display_tz.name());
    info!("╚═══════════════════════════════════════╝");

    let markets = GammaMarkets::new(&config)?;
    let prices = CoinGeckoPrice::new(&config)?;
    let sink = WebhookSink::new(&config)?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Ctrl-C received");
            let _ = shutdown_tx.send(true);
        }
    });

    let mut monitor = Monitor::new(config, markets, prices, sink);
    monitor.run(shutdown_rx).await;

    Ok(())
}
