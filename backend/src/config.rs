use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::models::Asset;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{key} has an invalid value {value:?}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
    #[error("{0} must be at least 1")]
    ZeroWindow(&'static str),
}

/// Exchange REST settings.
#[derive(Debug, Clone)]
pub struct ExchangeConfig {
    pub base_url: String,
    pub timeout: Duration,
    /// Trading pair per supported asset. An asset missing here is unsupported.
    pub symbols: BTreeMap<Asset, String>,
    /// Range used when the caller omits `start_time`.
    pub default_lookback_days: i64,
}

impl ExchangeConfig {
    /// Hard ceiling on rows per klines request imposed by the exchange.
    /// Ranges that need more rows are truncated; nothing paginates.
    pub const MAX_ROWS_PER_REQUEST: u32 = 1000;

    pub fn symbol_for(&self, asset: Asset) -> Option<&str> {
        self.symbols.get(&asset).map(String::as_str)
    }
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.binance.com".to_string(),
            timeout: Duration::from_secs(10),
            symbols: Asset::ALL
                .iter()
                .map(|asset| (*asset, asset.default_symbol().to_string()))
                .collect(),
            default_lookback_days: 4 * 365,
        }
    }
}

/// Inference server settings. The model name is fixed here, never taken from callers.
#[derive(Debug, Clone)]
pub struct InferenceConfig {
    pub base_url: String,
    pub model: String,
    pub connect_timeout: Duration,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "zanalyx".to_string(),
            connect_timeout: Duration::from_secs(5),
        }
    }
}

/// Indicator windows, in samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndicatorConfig {
    pub ma_short_window: usize,
    pub ma_long_window: usize,
    pub volatility_window: usize,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            ma_short_window: 50,
            ma_long_window: 200,
            volatility_window: 30,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub exchange: ExchangeConfig,
    pub inference: InferenceConfig,
    pub indicators: IndicatorConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8000)),
            exchange: ExchangeConfig::default(),
            inference: InferenceConfig::default(),
            indicators: IndicatorConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup, falling back to defaults
    /// for absent keys.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = AppConfig::default();

        let exchange = ExchangeConfig {
            base_url: parse_url(&lookup, "EXCHANGE_BASE_URL", &defaults.exchange.base_url)?,
            timeout: Duration::from_secs(parse_or(
                &lookup,
                "EXCHANGE_TIMEOUT_SECS",
                defaults.exchange.timeout.as_secs(),
            )?),
            symbols: defaults.exchange.symbols,
            default_lookback_days: parse_lookback_days(
                &lookup,
                "HISTORY_LOOKBACK_DAYS",
                defaults.exchange.default_lookback_days,
            )?,
        };

        let inference = InferenceConfig {
            base_url: parse_url(&lookup, "INFERENCE_BASE_URL", &defaults.inference.base_url)?,
            model: lookup("INFERENCE_MODEL").unwrap_or(defaults.inference.model),
            connect_timeout: defaults.inference.connect_timeout,
        };

        let indicators = IndicatorConfig {
            ma_short_window: parse_window(&lookup, "MA_SHORT_WINDOW", defaults.indicators.ma_short_window)?,
            ma_long_window: parse_window(&lookup, "MA_LONG_WINDOW", defaults.indicators.ma_long_window)?,
            volatility_window: parse_window(
                &lookup,
                "VOLATILITY_WINDOW",
                defaults.indicators.volatility_window,
            )?,
        };

        Ok(Self {
            bind_addr: parse_or(&lookup, "BIND_ADDR", defaults.bind_addr)?,
            exchange,
            inference,
            indicators,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse::<T>().map_err(|e| ConfigError::Invalid {
            key,
            value: raw.clone(),
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}

fn parse_window<F>(lookup: &F, key: &'static str, default: usize) -> Result<usize, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let window = parse_or(lookup, key, default)?;
    if window == 0 {
        return Err(ConfigError::ZeroWindow(key));
    }
    Ok(window)
}

fn parse_lookback_days<F>(lookup: &F, key: &'static str, default: i64) -> Result<i64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let days: i64 = parse_or(lookup, key, default)?;
    if days <= 0 {
        return Err(ConfigError::Invalid {
            key,
            value: days.to_string(),
            reason: "must be a positive number of days".to_string(),
        });
    }
    Ok(days)
}

/// Validates the URL and returns it without a trailing slash so paths can be appended.
fn parse_url<F>(lookup: &F, key: &'static str, default: &str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key).unwrap_or_else(|| default.to_string());
    Url::parse(&raw).map_err(|e| ConfigError::Invalid {
        key,
        value: raw.clone(),
        reason: e.to_string(),
    })?;
    Ok(raw.trim_end_matches('/').to_string())
}
