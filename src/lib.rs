//! BTC 15-min market monitor for Polymarket.
//!
//! Polls the Gamma API for freshly opened BTC up/down markets, scores each
//! one with a momentum/sentiment/volume heuristic, and posts a formatted
//! alert to a webhook. One alert per market per process run; a restart
//! clears the in-memory notified set.

pub mod alerts;
pub mod config;
pub mod detector;
pub mod error;
pub mod market;
pub mod monitor;
pub mod predictor;
pub mod price;
pub mod retry;
pub mod types;
