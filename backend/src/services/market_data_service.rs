use std::collections::BTreeMap;

use chrono::Utc;
use futures::future::try_join_all;
use tracing::{error, info, warn};

use crate::config::ExchangeConfig;
use crate::errors::AppError;
use crate::external::exchange::ExchangeClient;
use crate::models::{Asset, Candle, HistoricalData, Interval};
use crate::services::aligner;

const MS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Ranges shorter than this are sampled daily, longer ones weekly.
const DAILY_SAMPLING_MAX_DAYS: i64 = 365;

/// Inclusive `[start, end]` bounds in Unix milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start_ms: i64,
    pub end_ms: i64,
}

impl TimeRange {
    /// Fills missing bounds: `end` defaults to `now_ms`, `start` to
    /// `lookback_days` before `now_ms`.
    ///
    /// Rejects ranges whose start is not before the end, and ranges whose span
    /// does not fit in an `i64`.
    pub fn resolve(
        start_ms: Option<i64>,
        end_ms: Option<i64>,
        now_ms: i64,
        lookback_days: i64,
    ) -> Result<Self, AppError> {
        let end_ms = end_ms.unwrap_or(now_ms);
        let start_ms =
            start_ms.unwrap_or_else(|| now_ms.saturating_sub(lookback_days.saturating_mul(MS_PER_DAY)));

        match end_ms.checked_sub(start_ms) {
            Some(span) if span > 0 => {}
            _ => return Err(AppError::InvalidRange { start: start_ms, end: end_ms }),
        }

        Ok(Self { start_ms, end_ms })
    }

    /// Daily candles below a year, weekly otherwise.
    pub fn interval(&self) -> Interval {
        if self.end_ms.saturating_sub(self.start_ms) < DAILY_SAMPLING_MAX_DAYS * MS_PER_DAY {
            Interval::Daily
        } else {
            Interval::Weekly
        }
    }
}

fn symbol_for(config: &ExchangeConfig, asset: Asset) -> Result<&str, AppError> {
    config
        .symbol_for(asset)
        .ok_or_else(|| AppError::UnsupportedAsset(asset.to_string()))
}

/// Fetches candles for `asset` over the requested range.
///
/// At most `ExchangeConfig::MAX_ROWS_PER_REQUEST` rows come back; a range that
/// needs more is truncated by the exchange.
pub async fn fetch_candles(
    exchange: &dyn ExchangeClient,
    config: &ExchangeConfig,
    asset: Asset,
    start_ms: Option<i64>,
    end_ms: Option<i64>,
) -> Result<Vec<Candle>, AppError> {
    let symbol = symbol_for(config, asset)?;
    let range = TimeRange::resolve(
        start_ms,
        end_ms,
        Utc::now().timestamp_millis(),
        config.default_lookback_days,
    )?;
    let interval = range.interval();

    info!(
        "Fetching {} candles for {} ({}) from {} to {}",
        interval.as_str(),
        asset,
        symbol,
        range.start_ms,
        range.end_ms
    );

    let candles = exchange
        .fetch_klines(
            symbol,
            interval,
            range.start_ms,
            range.end_ms,
            ExchangeConfig::MAX_ROWS_PER_REQUEST,
        )
        .await
        .map_err(|e| {
            error!("Failed to fetch candles for {}: {}", asset, e);
            AppError::from(e)
        })?;

    if candles.len() as u32 >= ExchangeConfig::MAX_ROWS_PER_REQUEST {
        warn!(
            "Candle fetch for {} hit the {}-row ceiling; range may be truncated",
            asset,
            ExchangeConfig::MAX_ROWS_PER_REQUEST
        );
    }

    Ok(candles)
}

pub async fn get_historical(
    exchange: &dyn ExchangeClient,
    config: &ExchangeConfig,
    asset: Asset,
    start_ms: Option<i64>,
    end_ms: Option<i64>,
) -> Result<HistoricalData, AppError> {
    let candles = fetch_candles(exchange, config, asset, start_ms, end_ms).await?;
    Ok(aligner::align(&candles).into())
}

/// Current price of every configured asset, keyed by asset name.
pub async fn get_current_prices(
    exchange: &dyn ExchangeClient,
    config: &ExchangeConfig,
) -> Result<BTreeMap<String, f64>, AppError> {
    let lookups = config.symbols.iter().map(|(asset, symbol)| async move {
        exchange
            .fetch_spot_price(symbol)
            .await
            .map(|price| (asset.to_string(), price))
            .map_err(|e| {
                error!("Failed to fetch spot price for {} ({}): {}", asset, symbol, e);
                AppError::from(e)
            })
    });

    Ok(try_join_all(lookups).await?.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000_000;

    #[test]
    fn test_resolve_defaults_to_lookback() {
        let range = TimeRange::resolve(None, None, NOW, 1460).unwrap();
        assert_eq!(range.end_ms, NOW);
        assert_eq!(range.start_ms, NOW - 1460 * MS_PER_DAY);
        assert_eq!(range.interval(), Interval::Weekly);
    }

    #[test]
    fn test_resolve_keeps_explicit_bounds() {
        let range = TimeRange::resolve(Some(1_000), Some(5_000), NOW, 1460).unwrap();
        assert_eq!(range, TimeRange { start_ms: 1_000, end_ms: 5_000 });
    }

    #[test]
    fn test_resolve_only_end_given() {
        let end = NOW - 10 * MS_PER_DAY;
        let range = TimeRange::resolve(None, Some(end), NOW, 30).unwrap();
        assert_eq!(range.start_ms, NOW - 30 * MS_PER_DAY);
        assert_eq!(range.end_ms, end);
    }

    #[test]
    fn test_resolve_rejects_inverted_range() {
        let result = TimeRange::resolve(Some(5_000), Some(1_000), NOW, 1460);
        assert!(matches!(result, Err(AppError::InvalidRange { start: 5_000, end: 1_000 })));

        let result = TimeRange::resolve(Some(5_000), Some(5_000), NOW, 1460);
        assert!(result.is_err());
    }

    #[test]
    fn test_resolve_rejects_overflowing_range() {
        let result = TimeRange::resolve(Some(i64::MIN), Some(i64::MAX), NOW, 1460);
        assert!(matches!(
            result,
            Err(AppError::InvalidRange { start: i64::MIN, end: i64::MAX })
        ));

        let result = TimeRange::resolve(Some(-NOW), Some(i64::MAX), NOW, 1460);
        assert!(result.is_err());
    }

    #[test]
    fn test_resolve_saturates_huge_lookback() {
        let range = TimeRange::resolve(None, Some(NOW), NOW, i64::MAX).unwrap();
        assert_eq!(range.start_ms, NOW - i64::MAX);
        assert_eq!(range.interval(), Interval::Weekly);

        let result = TimeRange::resolve(None, Some(i64::MAX), -NOW, i64::MAX);
        assert!(matches!(result, Err(AppError::InvalidRange { start: i64::MIN, end: i64::MAX })));
    }

    #[test]
    fn test_resolve_accepts_widest_representable_span() {
        let range = TimeRange::resolve(Some(0), Some(i64::MAX), NOW, 1460).unwrap();
        assert_eq!(range.interval(), Interval::Weekly);
    }

    #[test]
    fn test_interval_boundary_at_one_year() {
        let just_under = TimeRange { start_ms: 0, end_ms: 365 * MS_PER_DAY - 1 };
        assert_eq!(just_under.interval(), Interval::Daily);

        let exactly_one_year = TimeRange { start_ms: 0, end_ms: 365 * MS_PER_DAY };
        assert_eq!(exactly_one_year.interval(), Interval::Weekly);

        let thirty_days = TimeRange { start_ms: NOW - 30 * MS_PER_DAY, end_ms: NOW };
        assert_eq!(thirty_days.interval(), Interval::Daily);
    }
}
