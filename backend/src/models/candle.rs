use serde::{Deserialize, Serialize};

/// One exchange kline reduced to the fields the pipeline consumes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    /// Open time, Unix milliseconds.
    pub open_time: i64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    pub fn new(open_time: i64, close: f64, volume: f64) -> Self {
        Self { open_time, close, volume }
    }
}

/// Kline sampling granularity requested from the exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interval {
    Daily,
    Weekly,
}

impl Interval {
    /// Exchange query-string value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Interval::Daily => "1d",
            Interval::Weekly => "1w",
        }
    }
}
