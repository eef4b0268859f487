use async_trait::async_trait;
use thiserror::Error;

use crate::models::{Candle, Interval};

#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error("network error: {0}")]
    Network(String),

    #[error("exchange returned status {0}")]
    Status(u16),

    #[error("parse error: {0}")]
    Parse(String),
}

/// Source of raw market data for exchange trading pairs.
#[async_trait]
pub trait ExchangeClient: Send + Sync {
    /// Candles with open time in `[start_ms, end_ms]`, oldest first, at most `limit` rows.
    async fn fetch_klines(
        &self,
        symbol: &str,
        interval: Interval,
        start_ms: i64,
        end_ms: i64,
        limit: u32,
    ) -> Result<Vec<Candle>, ExchangeError>;

    /// Last traded price for a trading pair.
    async fn fetch_spot_price(&self, symbol: &str) -> Result<f64, ExchangeError>;
}
