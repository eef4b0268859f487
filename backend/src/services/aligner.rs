use tracing::warn;

use crate::models::{AlignedSeries, Candle, SeriesPoint};

/// Splits candles into price (close) and volume series, one point per candle,
/// in the order received. Nothing is resampled or filled in.
pub fn align(candles: &[Candle]) -> AlignedSeries {
    if !is_strictly_increasing(candles) {
        warn!(
            "Candle open times are not strictly increasing ({} candles); series kept in received order",
            candles.len()
        );
    }

    let (prices, volumes) = candles
        .iter()
        .map(|c| (SeriesPoint(c.open_time, c.close), SeriesPoint(c.open_time, c.volume)))
        .unzip();

    AlignedSeries { prices, volumes }
}

fn is_strictly_increasing(candles: &[Candle]) -> bool {
    candles.windows(2).all(|w| w[0].open_time < w[1].open_time)
}

/// Bare values of a series, for the indicator functions.
pub fn values(series: &[SeriesPoint]) -> Vec<f64> {
    series.iter().map(SeriesPoint::value).collect()
}
