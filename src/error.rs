use thiserror::Error;

/// Failure classification for the monitor.
///
/// The poll loop routes on the variant: a `Fetch` aborts the current cycle,
/// `DataUnavailable` and `Delivery` skip a single market (leaving it eligible
/// for retry while still inside the new-market window), and `Config` is fatal
/// before the loop ever starts.
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("market fetch failed: {0}")]
    Fetch(String),

    #[error("price data unavailable: {0}")]
    DataUnavailable(String),

    #[error("notification delivery failed: {0}")]
    Delivery(String),

    #[error("configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, MonitorError>;
