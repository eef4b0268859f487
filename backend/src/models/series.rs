use serde::{Deserialize, Serialize};

/// `(timestamp_ms, value)` pair. Serializes as a two-element JSON array.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint(pub i64, pub f64);

impl SeriesPoint {
    pub fn timestamp(&self) -> i64 {
        self.0
    }

    pub fn value(&self) -> f64 {
        self.1
    }
}

/// Price and volume series produced from one candle fetch, index-aligned.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AlignedSeries {
    pub prices: Vec<SeriesPoint>,
    pub volumes: Vec<SeriesPoint>,
}

/// Body of `GET /crypto/historical/{symbol}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalData {
    pub prices: Vec<SeriesPoint>,
    pub total_volumes: Vec<SeriesPoint>,
}

impl From<AlignedSeries> for HistoricalData {
    fn from(series: AlignedSeries) -> Self {
        Self {
            prices: series.prices,
            total_volumes: series.volumes,
        }
    }
}

/// Body of `GET /crypto/advanced-metrics/{symbol}`.
///
/// Indicator series carry only defined points, so they can be shorter than
/// `volumes`. Every timestamp is one of the source candle open times.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsPayload {
    pub ma_short: Vec<SeriesPoint>,
    pub ma_long: Vec<SeriesPoint>,
    pub volatility: Vec<SeriesPoint>,
    pub volumes: Vec<SeriesPoint>,
}
