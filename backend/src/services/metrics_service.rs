use tracing::{error, info};

use crate::config::{ExchangeConfig, IndicatorConfig};
use crate::errors::AppError;
use crate::external::exchange::ExchangeClient;
use crate::models::{Asset, MetricsPayload, SeriesPoint};
use crate::services::{aligner, indicators, market_data_service};

/// Keeps the defined entries of an indicator, stamped with the timestamp of
/// the price point at the same index.
pub fn compact(prices: &[SeriesPoint], indicator: &[Option<f64>]) -> Vec<SeriesPoint> {
    prices
        .iter()
        .zip(indicator)
        .filter_map(|(point, value)| value.map(|v| SeriesPoint(point.timestamp(), v)))
        .collect()
}

/// Combines the aligned series and full-length indicator series into the
/// response payload.
///
/// Every indicator must be exactly as long as `prices`. A mismatch means an
/// indicator was computed wrong and is reported as `LengthMismatch`.
pub fn assemble(
    prices: &[SeriesPoint],
    volumes: &[SeriesPoint],
    ma_short: &[Option<f64>],
    ma_long: &[Option<f64>],
    volatility: &[Option<f64>],
) -> Result<MetricsPayload, AppError> {
    let expected = prices.len();
    if ma_short.len() != expected || ma_long.len() != expected || volatility.len() != expected {
        error!(
            "Indicator length mismatch (defect): prices {}, ma_short {}, ma_long {}, volatility {}",
            expected,
            ma_short.len(),
            ma_long.len(),
            volatility.len()
        );
        return Err(AppError::LengthMismatch {
            expected,
            ma_short: ma_short.len(),
            ma_long: ma_long.len(),
            volatility: volatility.len(),
        });
    }

    Ok(MetricsPayload {
        ma_short: compact(prices, ma_short),
        ma_long: compact(prices, ma_long),
        volatility: compact(prices, volatility),
        volumes: volumes.to_vec(),
    })
}

/// Runs the indicator engine over an aligned price series and assembles the payload.
pub fn derive_metrics(
    prices: &[SeriesPoint],
    volumes: &[SeriesPoint],
    windows: &IndicatorConfig,
) -> Result<MetricsPayload, AppError> {
    let closes = aligner::values(prices);

    let ma_short = indicators::sma(&closes, windows.ma_short_window);
    let ma_long = indicators::sma(&closes, windows.ma_long_window);
    let volatility = indicators::rolling_volatility(&closes, windows.volatility_window);

    assemble(prices, volumes, &ma_short, &ma_long, &volatility)
}

/// Fetch, align and derive moving averages and volatility for one asset.
pub async fn get_advanced_metrics(
    exchange: &dyn ExchangeClient,
    exchange_config: &ExchangeConfig,
    windows: &IndicatorConfig,
    asset: Asset,
    start_ms: Option<i64>,
    end_ms: Option<i64>,
) -> Result<MetricsPayload, AppError> {
    let candles =
        market_data_service::fetch_candles(exchange, exchange_config, asset, start_ms, end_ms).await?;
    let series = aligner::align(&candles);

    if series.prices.is_empty() {
        return Err(AppError::NoPriceData);
    }

    let payload = derive_metrics(&series.prices, &series.volumes, windows)?;
    info!(
        "Derived metrics for {}: {} points, ma_short {}, ma_long {}, volatility {}",
        asset,
        series.prices.len(),
        payload.ma_short.len(),
        payload.ma_long.len(),
        payload.volatility.len()
    );

    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(values: &[f64]) -> Vec<SeriesPoint> {
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| SeriesPoint(1_000 * (i as i64 + 1), v))
            .collect()
    }

    #[test]
    fn test_compact_moving_average_scenario() {
        let prices = series(&[1.0, 2.0, 4.0, 8.0]);
        let ma = indicators::sma(&aligner::values(&prices), 2);

        let compacted = compact(&prices, &ma);

        assert_eq!(
            compacted,
            vec![SeriesPoint(2_000, 1.5), SeriesPoint(3_000, 3.0), SeriesPoint(4_000, 6.0)]
        );
    }

    #[test]
    fn test_compact_keeps_every_defined_value_in_order() {
        let prices = series(&[5.0, 6.0, 7.0, 8.0, 9.0]);
        let indicator = vec![None, Some(0.1), None, Some(0.3), Some(0.4)];

        let compacted = compact(&prices, &indicator);

        let expected: Vec<SeriesPoint> = prices
            .iter()
            .zip(&indicator)
            .filter_map(|(p, v)| v.map(|v| SeriesPoint(p.timestamp(), v)))
            .collect();
        assert_eq!(compacted, expected);
        assert_eq!(compacted.len(), 3);
    }

    #[test]
    fn test_assemble_rejects_length_mismatch() {
        let prices = series(&[1.0, 2.0, 3.0]);
        let result = assemble(
            &prices,
            &prices,
            &[None, Some(1.5), Some(2.5)],
            &[None, None],
            &[None, None, None],
        );

        assert!(matches!(
            result,
            Err(AppError::LengthMismatch { expected: 3, ma_short: 3, ma_long: 2, volatility: 3 })
        ));
    }

    #[test]
    fn test_assemble_emits_volumes_in_full() {
        let prices = series(&[1.0, 2.0]);
        let volumes = series(&[10.0, 20.0]);
        let none = vec![None, None];

        let payload = assemble(&prices, &volumes, &none, &none, &none).unwrap();

        assert!(payload.ma_short.is_empty());
        assert!(payload.ma_long.is_empty());
        assert!(payload.volatility.is_empty());
        assert_eq!(payload.volumes, volumes);
    }

    #[test]
    fn test_single_price_has_empty_volatility() {
        let prices = series(&[100.0]);
        let payload = derive_metrics(&prices, &prices, &IndicatorConfig::default()).unwrap();
        assert!(payload.volatility.is_empty());
        assert_eq!(payload.volumes.len(), 1);
    }

    #[test]
    fn test_derive_metrics_lengths_with_default_windows() {
        let values: Vec<f64> = (0..250).map(|i| 20_000.0 + i as f64 * 10.0).collect();
        let prices = series(&values);

        let payload = derive_metrics(&prices, &prices, &IndicatorConfig::default()).unwrap();

        assert_eq!(payload.ma_short.len(), 250 - 49);
        assert_eq!(payload.ma_long.len(), 250 - 199);
        assert_eq!(payload.volatility.len(), 250 - 30);
        assert_eq!(payload.volumes.len(), 250);
        assert_eq!(payload.ma_short[0].timestamp(), prices[49].timestamp());
        assert_eq!(payload.ma_long[0].timestamp(), prices[199].timestamp());
        assert_eq!(payload.volatility[0].timestamp(), prices[30].timestamp());
    }

    #[test]
    fn test_indicator_timestamps_are_subset_of_prices() {
        let values: Vec<f64> = (0..90).map(|i| 50.0 + (i as f64 * 0.4).sin()).collect();
        let prices = series(&values);
        let windows = IndicatorConfig { ma_short_window: 7, ma_long_window: 21, volatility_window: 14 };

        let payload = derive_metrics(&prices, &prices, &windows).unwrap();

        let timestamps: Vec<i64> = prices.iter().map(SeriesPoint::timestamp).collect();
        for indicator in [&payload.ma_short, &payload.ma_long, &payload.volatility] {
            let ts: Vec<i64> = indicator.iter().map(SeriesPoint::timestamp).collect();
            assert!(ts.windows(2).all(|w| w[0] < w[1]));
            assert!(ts.iter().all(|t| timestamps.contains(t)));
        }
    }

    #[test]
    fn test_assembly_is_deterministic() {
        let values: Vec<f64> = (0..80).map(|i| 1.0 + (i as f64).sqrt()).collect();
        let prices = series(&values);
        let windows = IndicatorConfig { ma_short_window: 5, ma_long_window: 20, volatility_window: 10 };

        let first = serde_json::to_vec(&derive_metrics(&prices, &prices, &windows).unwrap()).unwrap();
        let second = serde_json::to_vec(&derive_metrics(&prices, &prices, &windows).unwrap()).unwrap();

        assert_eq!(first, second);
    }
}
